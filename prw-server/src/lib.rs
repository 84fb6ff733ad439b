//! Receiver for the remote-write protocol family.
//!
//! The [`WriteReceiver`] accepts 1.0 and 2.0 write requests over HTTP, decompresses them and
//! hands them to a [`WriteStorage`]. Storages that prefer decoded messages over raw protobuf
//! payloads implement [`DecodedStorage`] and are wrapped in a [`DecodingStorage`].
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use prw_protocol::{v1, v2};
//! use prw_server::{
//!     DecodedStorage, DecodingStorage, ReceiverConfig, StorageError, WriteReceiver, WriteResponse,
//! };
//!
//! struct Discard;
//!
//! #[async_trait]
//! impl DecodedStorage for Discard {
//!     async fn store_v1(
//!         &self,
//!         _request: v1::WriteRequest,
//!         _response: &mut WriteResponse,
//!     ) -> Result<(), StorageError> {
//!         Ok(())
//!     }
//!
//!     async fn store_v2(
//!         &self,
//!         _request: v2::Request,
//!         _response: &mut WriteResponse,
//!     ) -> Result<(), StorageError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> std::io::Result<()> {
//! let receiver = WriteReceiver::new(DecodingStorage::new(Discard), ReceiverConfig::default());
//! let router = receiver.into_router("/api/v1/write");
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9090").await?;
//! axum::serve(listener, router).await
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod receiver;
mod steps;
mod storage;

pub use self::config::*;
pub use self::receiver::*;
pub use self::steps::*;
pub use self::storage::*;
