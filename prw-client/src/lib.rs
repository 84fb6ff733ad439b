//! Retrying client for the remote-write protocol family.
//!
//! The [`WriteClient`] sends [`WriteMessage`](prw_protocol::WriteMessage)s to a remote-write
//! receiver. It negotiates the protocol from the message type, compresses the payload and retries
//! failed attempts with exponential backoff, honoring `Retry-After` hints of the receiver.
//!
//! # Example
//!
//! ```no_run
//! use prw_client::{ClientConfig, WriteClient};
//! use prw_protocol::v1;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = WriteClient::new("http://localhost:9090/", ClientConfig::default())?;
//! let cancel = CancellationToken::new();
//!
//! let request = v1::WriteRequest::default();
//! match client.write(&request, &cancel).await {
//!     Ok(stats) => prw_log::info!(samples = stats.samples, "write succeeded"),
//!     Err(failure) => prw_log::error!(
//!         error = &failure.error as &dyn std::error::Error,
//!         samples = failure.stats.samples,
//!         "write failed"
//!     ),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod backoff;
mod client;
mod config;
mod error;
mod retry_after;

pub use self::backoff::*;
pub use self::client::*;
pub use self::config::*;
pub use self::error::{MAX_ERROR_BODY, WriteError, WriteFailure};
pub use self::retry_after::*;
