//! Transformations applied to a request body before it reaches the storage.

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_ENCODING;
use http::{HeaderMap, StatusCode};
use prw_protocol::Compression;

use crate::ReceiverConfig;

/// Rejection of a request by a [`RequestStep`], sent to the client as plain text.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StepRejection {
    status: StatusCode,
    message: String,
}

impl StepRejection {
    /// Creates a rejection with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response body.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for StepRejection {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// A transformation of the request body.
///
/// Steps run in order and each step receives the output of the previous one. A step may update
/// the request headers to reflect its transformation.
pub trait RequestStep: Send + Sync {
    /// Transforms the body or rejects the request.
    fn apply(&self, headers: &mut HeaderMap, body: Bytes) -> Result<Bytes, StepRejection>;
}

/// Decompresses snappy encoded bodies.
///
/// A missing or empty `Content-Encoding` is treated as snappy, as all remote-write senders
/// compress. Any value other than exactly `snappy` is rejected with
/// `415 Unsupported Media Type`. Bodies that decompress to more than the configured maximum are
/// rejected with `413 Payload Too Large` before decompression.
#[derive(Clone, Copy, Debug)]
pub struct SnappyDecompression {
    max_size: usize,
}

impl SnappyDecompression {
    /// Creates the step with a limit for the decompressed body size in bytes.
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for SnappyDecompression {
    fn default() -> Self {
        Self::new(ReceiverConfig::default().max_decompressed_size)
    }
}

impl RequestStep for SnappyDecompression {
    fn apply(&self, headers: &mut HeaderMap, body: Bytes) -> Result<Bytes, StepRejection> {
        let encoding = headers
            .get(CONTENT_ENCODING)
            .map(|value| value.as_bytes())
            .unwrap_or_default();

        if !encoding.is_empty() && encoding != Compression::Snappy.name().as_bytes() {
            return Err(StepRejection::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!(
                    "{} encoding (compression) is not accepted by this server; \
                     only snappy is acceptable",
                    String::from_utf8_lossy(encoding)
                ),
            ));
        }

        let len = Compression::Snappy
            .decompressed_len(&body)
            .map_err(|error| StepRejection::new(StatusCode::BAD_REQUEST, error.to_string()))?;

        if len > self.max_size {
            return Err(StepRejection::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "decompressed body of {len} bytes exceeds the limit of {} bytes",
                    self.max_size
                ),
            ));
        }

        let decompressed = Compression::Snappy.decompress(&body).map_err(|error| {
            prw_log::debug!(
                error = &error as &dyn std::error::Error,
                "failed to decompress request body"
            );
            StepRejection::new(StatusCode::BAD_REQUEST, error.to_string())
        })?;

        headers.remove(CONTENT_ENCODING);
        Ok(decompressed.into())
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn compressed(input: &[u8]) -> Bytes {
        let mut buf = Vec::new();
        Compression::Snappy.compress(input, &mut buf).unwrap().to_vec().into()
    }

    #[test]
    fn test_snappy() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("snappy"));

        let body = SnappyDecompression::default()
            .apply(&mut headers, compressed(b"payload"))
            .unwrap();

        assert_eq!(body, &b"payload"[..]);
        assert!(!headers.contains_key(CONTENT_ENCODING));
    }

    #[test]
    fn test_missing_encoding_is_snappy() {
        let body = SnappyDecompression::default()
            .apply(&mut HeaderMap::new(), compressed(b"payload"))
            .unwrap();
        assert_eq!(body, &b"payload"[..]);
    }

    #[test]
    fn test_unsupported_encoding() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));

        // Not even attempted, the body is not snappy.
        let rejection = SnappyDecompression::default()
            .apply(&mut headers, Bytes::from_static(b"\x1f\x8b"))
            .unwrap_err();

        assert_eq!(rejection.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            rejection.message(),
            "gzip encoding (compression) is not accepted by this server; only snappy is acceptable"
        );
    }

    #[test]
    fn test_encoding_compared_exactly() {
        for value in ["Snappy", " snappy", "SNAPPY"] {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_ENCODING, HeaderValue::from_str(value).unwrap());

            let rejection = SnappyDecompression::default()
                .apply(&mut headers, compressed(b"payload"))
                .unwrap_err();
            assert_eq!(rejection.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE, "{value}");
        }
    }

    #[test]
    fn test_decompressed_too_large() {
        let step = SnappyDecompression::new(100);
        assert!(step.apply(&mut HeaderMap::new(), compressed(&[0; 100])).is_ok());

        let rejection = step
            .apply(&mut HeaderMap::new(), compressed(&[0; 101]))
            .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_corrupt_body() {
        let rejection = SnappyDecompression::default()
            .apply(&mut HeaderMap::new(), Bytes::from_static(b"\xff\xff\xff\xff"))
            .unwrap_err();
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
    }
}
