use prost::Message;

use crate::{WriteProto, v1, v2};

/// An error returned by [`DecodedRequest::decode`].
#[derive(Debug, thiserror::Error)]
#[error("failed to decode {proto} payload")]
pub struct DecodeError {
    proto: WriteProto,
    #[source]
    source: prost::DecodeError,
}

impl DecodeError {
    /// The protocol the payload was decoded as.
    pub fn proto(&self) -> WriteProto {
        self.proto
    }
}

/// A decompressed request body decoded into the message of its protocol.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedRequest {
    /// A 1.0 request.
    V1(v1::WriteRequest),
    /// A 2.0 request.
    V2(v2::Request),
}

impl DecodedRequest {
    /// Decodes an uncompressed protobuf payload of the given protocol.
    pub fn decode(proto: WriteProto, payload: &[u8]) -> Result<Self, DecodeError> {
        let result = match proto {
            WriteProto::V1 => v1::WriteRequest::decode(payload).map(Self::V1),
            WriteProto::V2 => v2::Request::decode(payload).map(Self::V2),
        };

        result.map_err(|source| DecodeError { proto, source })
    }

    /// Returns the protocol of this request.
    pub fn proto(&self) -> WriteProto {
        match self {
            Self::V1(_) => WriteProto::V1,
            Self::V2(_) => WriteProto::V2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Encoder, SymbolTable};

    #[test]
    fn test_decode_v2() {
        let mut table = SymbolTable::new();
        let labels_refs = table.symbolize_labels(&["__name__", "up", "job", "node"], Vec::new());
        let request = v2::Request {
            timeseries: vec![v2::TimeSeries {
                labels_refs,
                samples: vec![v2::Sample {
                    value: 1.0,
                    timestamp: 1,
                }],
                ..Default::default()
            }],
            symbols: table.symbols().to_vec(),
        };

        let mut encoder = Encoder::new();
        let payload = encoder.encode(&request).unwrap();
        let decoded = DecodedRequest::decode(WriteProto::V2, payload).unwrap();

        assert_eq!(decoded.proto(), WriteProto::V2);
        assert_eq!(decoded, DecodedRequest::V2(request));
    }

    #[test]
    fn test_decode_garbage() {
        let error = DecodedRequest::decode(WriteProto::V1, b"\xff\xff\xff").unwrap_err();
        assert_eq!(error.proto(), WriteProto::V1);
        assert_eq!(
            error.to_string(),
            "failed to decode prometheus.WriteRequest payload"
        );
    }
}
