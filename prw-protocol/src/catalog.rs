//! Catalog of the supported remote-write protocol versions.
//!
//! Each protocol version is identified by the fully qualified name of its protobuf message. The
//! name travels in the `proto` parameter of the `Content-Type` header, see [`WriteProto`].

use std::fmt;
use std::str::FromStr;

/// The base media type of all remote-write payloads.
pub const PROTOBUF_MEDIA_TYPE: &str = "application/x-protobuf";

/// Header announcing the protocol version of a write request.
pub const VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";

/// Value of [`VERSION_HEADER`] for senders in 1.0 compatibility mode.
pub const VERSION_1_HEADER_VALUE: &str = "0.1.0";

/// Value of [`VERSION_HEADER`] for 2.0 senders.
pub const VERSION_2_HEADER_VALUE: &str = "2.0.0";

/// Header counting the retries of a write request, starting at `1` for the first retry.
pub const RETRY_ATTEMPT_HEADER: &str = "Retry-Attempt";

const V1_NAME: &str = "prometheus.WriteRequest";
const V2_NAME: &str = "io.prometheus.write.v2.Request";
const V2_CONTENT_TYPE: &str = "application/x-protobuf;proto=io.prometheus.write.v2.Request";

/// An error raised while identifying the protocol of a write request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The protobuf message name is not one of the supported protocols.
    #[error("unknown remote write protobuf message {name}, supported: {supported}")]
    UnknownProtocol {
        /// The rejected message name.
        name: String,
        /// Comma separated, sorted list of supported message names.
        supported: String,
    },
    /// The content type does not start with the protobuf media type.
    #[error("expected application/x-protobuf as the first (media) part, got {0} content-type")]
    UnexpectedMediaType(String),
    /// A content type parameter is not a `key=value` pair.
    #[error("expected parameters to be key-values, got {parameter} in {content_type} content-type")]
    MalformedParameter {
        /// The offending parameter.
        parameter: String,
        /// The full content type.
        content_type: String,
    },
}

/// Identity of a remote-write protocol version.
///
/// The identity is the fully qualified name of the protobuf message carried in the request body.
/// Values can only be obtained from the two known variants or through [`WriteProto::validate`],
/// which checks membership in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WriteProto {
    /// The `prometheus.WriteRequest` message of the 1.0 protocol.
    V1,
    /// The `io.prometheus.write.v2.Request` message of the 2.0 protocol.
    V2,
}

impl WriteProto {
    /// All supported protocols.
    pub const ALL: [WriteProto; 2] = [WriteProto::V1, WriteProto::V2];

    /// Returns the protocol for the given fully qualified message name.
    ///
    /// Fails with [`ProtocolError::UnknownProtocol`] listing all supported names otherwise.
    pub fn validate(name: &str) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|proto| proto.name() == name)
            .ok_or_else(|| ProtocolError::UnknownProtocol {
                name: name.to_owned(),
                supported: supported_names(),
            })
    }

    /// Returns the fully qualified name of the protobuf message.
    pub const fn name(self) -> &'static str {
        match self {
            WriteProto::V1 => V1_NAME,
            WriteProto::V2 => V2_NAME,
        }
    }

    /// Returns the canonical `Content-Type` header value.
    ///
    /// The 1.0 protocol uses the bare media type, which is what 1.0 receivers expect.
    pub const fn content_type(self) -> &'static str {
        match self {
            WriteProto::V1 => PROTOBUF_MEDIA_TYPE,
            WriteProto::V2 => V2_CONTENT_TYPE,
        }
    }

    /// Returns the value of the [`VERSION_HEADER`] sent along with this protocol.
    pub const fn version_header_value(self) -> &'static str {
        match self {
            WriteProto::V1 => VERSION_1_HEADER_VALUE,
            WriteProto::V2 => VERSION_2_HEADER_VALUE,
        }
    }

    /// Parses the protocol from a `Content-Type` header value.
    ///
    /// Accepted forms are:
    ///  - `application/x-protobuf;proto=io.prometheus.write.v2.Request` for 2.0 requests,
    ///  - `application/x-protobuf;proto=prometheus.WriteRequest` for 1.0 requests,
    ///  - `application/x-protobuf` for 1.0 requests of senders that predate the parameter.
    ///
    /// Parameters other than `proto` are ignored, but must be well formed.
    pub fn parse_content_type(content_type: &str) -> Result<Self, ProtocolError> {
        let content_type = content_type.trim();
        let mut parts = content_type.split(';');

        if parts.next().map(str::trim) != Some(PROTOBUF_MEDIA_TYPE) {
            return Err(ProtocolError::UnexpectedMediaType(content_type.to_owned()));
        }

        for parameter in parts {
            let mut pair = parameter.split('=');
            let (Some(key), Some(value), None) = (pair.next(), pair.next(), pair.next()) else {
                return Err(ProtocolError::MalformedParameter {
                    parameter: parameter.to_owned(),
                    content_type: content_type.to_owned(),
                });
            };

            if key.trim() == "proto" {
                return Self::validate(value.trim());
            }
        }

        Ok(WriteProto::V1)
    }
}

fn supported_names() -> String {
    let mut names = WriteProto::ALL.map(WriteProto::name);
    names.sort_unstable();
    names.join(", ")
}

impl fmt::Display for WriteProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WriteProto {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}

crate::impl_str_serde!(WriteProto, "a remote write protobuf message name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_known() {
        assert_eq!(
            WriteProto::validate("prometheus.WriteRequest"),
            Ok(WriteProto::V1)
        );
        assert_eq!(
            WriteProto::validate("io.prometheus.write.v2.Request"),
            Ok(WriteProto::V2)
        );
    }

    #[test]
    fn test_validate_unknown_lists_sorted() {
        let error = WriteProto::validate("io.prometheus.write.v3.Request").unwrap_err();
        assert_eq!(
            error.to_string(),
            "unknown remote write protobuf message io.prometheus.write.v3.Request, \
             supported: io.prometheus.write.v2.Request, prometheus.WriteRequest"
        );
    }

    #[test]
    fn test_content_type_round_trip() {
        for proto in WriteProto::ALL {
            assert_eq!(
                WriteProto::parse_content_type(proto.content_type()),
                Ok(proto)
            );
        }
    }

    #[test]
    fn test_parse_bare_media_type_is_v1() {
        assert_eq!(
            WriteProto::parse_content_type("application/x-protobuf"),
            Ok(WriteProto::V1)
        );
        assert_eq!(
            WriteProto::parse_content_type("  application/x-protobuf  "),
            Ok(WriteProto::V1)
        );
    }

    #[test]
    fn test_parse_explicit_v1() {
        assert_eq!(
            WriteProto::parse_content_type("application/x-protobuf;proto=prometheus.WriteRequest"),
            Ok(WriteProto::V1)
        );
    }

    #[test]
    fn test_parse_first_proto_parameter_wins() {
        assert_eq!(
            WriteProto::parse_content_type(
                "application/x-protobuf;charset=utf-8;proto=io.prometheus.write.v2.Request;proto=prometheus.WriteRequest"
            ),
            Ok(WriteProto::V2)
        );
    }

    #[test]
    fn test_parse_wrong_media_type() {
        let error = WriteProto::parse_content_type("application/json").unwrap_err();
        assert!(matches!(error, ProtocolError::UnexpectedMediaType(_)));
    }

    #[test]
    fn test_parse_malformed_parameter() {
        for content_type in [
            "application/x-protobuf;proto",
            "application/x-protobuf;proto=a=b",
        ] {
            let error = WriteProto::parse_content_type(content_type).unwrap_err();
            assert!(
                matches!(error, ProtocolError::MalformedParameter { .. }),
                "{content_type}: {error}"
            );
        }
    }

    #[test]
    fn test_parse_unknown_proto_parameter() {
        let error =
            WriteProto::parse_content_type("application/x-protobuf;proto=foo.Bar").unwrap_err();
        assert!(matches!(error, ProtocolError::UnknownProtocol { .. }));
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&WriteProto::V2).unwrap();
        assert_eq!(json, r#""io.prometheus.write.v2.Request""#);

        let proto: WriteProto = serde_json::from_str(r#""prometheus.WriteRequest""#).unwrap();
        assert_eq!(proto, WriteProto::V1);

        assert!(serde_json::from_str::<WriteProto>(r#""nope""#).is_err());
    }
}
