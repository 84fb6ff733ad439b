//! Logging facade for the remote-write client and receiver.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The configuration
//! implements `serde` traits, so it can be obtained from configuration files.
//!
//! ```
//! # #[cfg(feature = "init")]
//! # {
//! use prw_log::{Level, LogConfig};
//!
//! let log_config = LogConfig {
//!     level: Level::Debug,
//!     ..LogConfig::default()
//! };
//!
//! prw_log::init(&log_config);
//! # }
//! ```
//!
//! # Logging
//!
//! The basic use of this crate is through the five logging macros: [`error!`], [`warn!`],
//! [`info!`], [`debug!`] and [`trace!`] where `error!` represents the highest-priority log messages
//! and `trace!` the lowest. The macros are re-exported from `tracing` and accept structured fields.
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation. Prefer short and precise log
//! messages over verbose text. Choose the log level according to these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior, such as failed requests that will be retried.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging.
//! - [`trace!`] for full auxiliary information.
//!
//! ## Logging Error Types
//!
//! Errors are attached as a structured field, so that their full source chain is preserved:
//!
//! ```
//! use std::io::{Error, ErrorKind};
//!
//! let custom_error = Error::new(ErrorKind::Other, "oh no!");
//! prw_log::error!(error = &custom_error as &dyn std::error::Error, "operation failed");
//! ```
//!
//! Where a plain string is needed, [`LogError`] formats an error together with its causes.
//!
//! # Testing
//!
//! For unit testing, there is a separate initialization macro [`init_test!`] that should be called
//! at the beginning of a test. It enables test mode of the logger and customizes log levels for the
//! current crate.
//!
//! ```
//! # #[cfg(feature = "test")]
//! # {
//! prw_log::init_test!();
//! # }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, info_span, trace, warn};

// Expose spans and instrumentation for async code.
#[doc(inline)]
pub use tracing::{Instrument, Span};
