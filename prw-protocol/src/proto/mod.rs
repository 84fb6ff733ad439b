//! Protobuf messages of the remote-write protocols.
//!
//! The messages are declared by hand with `prost` attributes. Field tags follow the published
//! protocol definitions.

mod native;
pub mod v1;
pub mod v2;

pub use self::native::*;
