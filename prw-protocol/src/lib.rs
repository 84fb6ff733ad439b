//! Wire protocol of the remote-write protocol family.
//!
//! This crate contains everything that is shared between senders and receivers of remote-write
//! requests:
//!
//!  - [`WriteProto`] identifies the 1.0 and 2.0 protocols and maps them to `Content-Type` values.
//!  - [`v1`] and [`v2`] declare the protobuf messages of both protocols.
//!  - [`SymbolTable`] interns label strings for 2.0 requests.
//!  - [`Encoder`] serializes [`WriteMessage`]s into a reusable buffer.
//!  - [`Compression`] compresses payloads for transport.
//!  - [`WriteResponseStats`] counts what a receiver wrote, as reported in response headers.
//!
//! # Example
//!
//! ```
//! use prw_protocol::{Compression, Encoder, SymbolTable, WriteMessage, v2};
//!
//! let mut symbols = SymbolTable::new();
//! let request = v2::Request {
//!     timeseries: vec![v2::TimeSeries {
//!         labels_refs: symbols.symbolize_labels(&["__name__", "up"], Vec::new()),
//!         samples: vec![v2::Sample { value: 1.0, timestamp: 1_700_000_000_000 }],
//!         ..Default::default()
//!     }],
//!     symbols: symbols.symbols().to_vec(),
//! };
//!
//! let mut encoder = Encoder::new();
//! let mut compressed = Vec::new();
//! let payload = encoder.encode(&request).unwrap();
//! let body = Compression::Snappy.compress(payload, &mut compressed).unwrap();
//!
//! assert_eq!(request.write_proto(), prw_protocol::WriteProto::V2);
//! assert!(!body.is_empty());
//! ```

#![warn(missing_docs)]

mod macros;

mod catalog;
mod compression;
mod decode;
mod encoder;
mod proto;
mod stats;
mod symbols;

pub use self::catalog::*;
pub use self::compression::*;
pub use self::decode::*;
pub use self::encoder::*;
pub use self::proto::*;
pub use self::stats::*;
pub use self::symbols::*;
