use prw_protocol::WriteProto;
use serde::{Deserialize, Serialize};

/// Configuration of a [`WriteReceiver`](crate::WriteReceiver).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Maximum size of a compressed request body in bytes.
    pub max_body_size: usize,
    /// Maximum size of a decompressed request body in bytes.
    pub max_decompressed_size: usize,
    /// Protocols accepted by the receiver. Requests of other protocols are rejected with `415`.
    pub accepted_protocols: Vec<WriteProto>,
}

impl ReceiverConfig {
    /// Returns `true` if requests of `proto` are accepted.
    pub fn accepts(&self, proto: WriteProto) -> bool {
        self.accepted_protocols.contains(&proto)
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            max_body_size: 32 * 1024 * 1024,          // 32MB
            max_decompressed_size: 256 * 1024 * 1024, // 256MB
            accepted_protocols: WriteProto::ALL.to_vec(),
        }
    }
}
