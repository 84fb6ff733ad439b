use std::fmt;

use http::StatusCode;
use prw_protocol::{CompressionError, EncodeError, WriteResponseStats};

/// Maximum number of response body bytes kept in errors.
pub const MAX_ERROR_BODY: usize = 1024;

/// An error of a single write attempt or the entire write.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The base URL or path of the client is invalid.
    #[error("invalid write url")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    HttpClient(#[source] reqwest::Error),

    /// The message could not be serialized.
    #[error("failed to encode write request")]
    Encode(#[from] EncodeError),

    /// The payload could not be compressed.
    #[error("failed to compress write request")]
    Compression(#[from] CompressionError),

    /// The request did not produce a response.
    #[error("failed to send write request")]
    Transport(#[source] reqwest::Error),

    /// The server responded with a `5xx` status.
    #[error("server returned HTTP status {status}: {body}")]
    ServerError {
        /// The response status.
        status: StatusCode,
        /// The beginning of the response body.
        body: String,
    },

    /// The server responded with `429 Too Many Requests`.
    #[error("rate limited by server: {body}")]
    RateLimited {
        /// The beginning of the response body.
        body: String,
    },

    /// The server rejected the request with a status that is not retried.
    #[error("server returned HTTP status {status}: {body}")]
    Status {
        /// The response status.
        status: StatusCode,
        /// The beginning of the response body.
        body: String,
    },

    /// A 2.0 request was acknowledged without any written data being reported.
    ///
    /// This happens with receivers that only understand the 1.0 protocol and ignore the
    /// `Content-Type` header.
    #[error(
        "sent 2.0 request{}, got 2xx, but response stats indicate {} samples, {} histograms and {} \
         exemplars were written; assuming the receiver only supports the 1.0 protocol",
        DisplaySent(.sent),
        .written.samples,
        .written.histograms,
        .written.exemplars
    )]
    LogicalAcceptance {
        /// Contents of the request, if known.
        sent: Option<WriteResponseStats>,
        /// Stats reported by the receiver.
        written: WriteResponseStats,
    },

    /// The write was cancelled by the caller.
    #[error("write cancelled")]
    Cancelled,
}

impl WriteError {
    /// Returns the status of the response that caused this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::ServerError { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            _ => None,
        }
    }
}

struct DisplaySent<'a>(&'a Option<WriteResponseStats>);

impl fmt::Display for DisplaySent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(sent) => write!(
                f,
                " with {} samples, {} histograms and {} exemplars",
                sent.samples, sent.histograms, sent.exemplars
            ),
            None => Ok(()),
        }
    }
}

/// The error of a failed write, along with the stats of all attempts.
///
/// Receivers may have written parts of the data before the write failed, so the stats are kept
/// even on failure.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct WriteFailure {
    /// Stats accumulated over all attempts.
    pub stats: WriteResponseStats,
    /// The error of the last attempt.
    #[source]
    pub error: WriteError,
}

impl WriteFailure {
    pub(crate) fn new(stats: WriteResponseStats, error: impl Into<WriteError>) -> Self {
        Self {
            stats,
            error: error.into(),
        }
    }
}

/// Truncates a response body for use in errors.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let end = body.len().min(MAX_ERROR_BODY);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
