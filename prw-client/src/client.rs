use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use prw_log::Instrument;
use prw_protocol::{
    Encoder, RETRY_ATTEMPT_HEADER, VERSION_HEADER, WriteMessage, WriteProto, WriteResponseStats,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{MAX_ERROR_BODY, body_excerpt};
use crate::{ClientConfig, RetryBackoff, WriteError, WriteFailure, retry_after_duration};

/// Callback invoked before every retry with the error of the failed attempt.
pub type RetryCallback = Box<dyn Fn(&WriteError) + Send + Sync>;

/// An encoded and compressed write request, ready to be sent.
struct Payload {
    proto: WriteProto,
    body: Bytes,
    baseline: Option<WriteResponseStats>,
}

/// Classification of a single attempt.
enum Outcome {
    Success,
    Retry {
        error: WriteError,
        retry_after: Duration,
    },
    Fatal(WriteError),
}

/// Client for a remote-write endpoint.
///
/// The client encodes and compresses each message once, then sends it until the receiver accepts
/// it, the retry budget is exhausted, or the write is cancelled. Failed attempts are retried when
/// they are caused by transport errors, `5xx` responses, or `429` responses if
/// [`retry_on_rate_limit`](ClientConfig::retry_on_rate_limit) is enabled.
///
/// Messages are sent with the 2.0 protocol if they carry a symbol table, see
/// [`WriteMessage::symbols`], and with the 1.0 protocol otherwise.
///
/// The client keeps its encoding buffers between writes. Use one client per concurrent writer.
pub struct WriteClient {
    http: reqwest::Client,
    url: Url,
    config: ClientConfig,
    encoder: Encoder,
    compressed: Vec<u8>,
    on_retry: Option<RetryCallback>,
}

impl WriteClient {
    /// Creates a client writing to `path` of the config, resolved against `base_url`.
    ///
    /// Resolution follows URL rules: the path replaces the last segment of the base URL unless the
    /// base URL ends with a slash.
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self, WriteError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connection_timeout())
            .build()
            .map_err(WriteError::HttpClient)?;

        Self::with_http_client(base_url, config, http)
    }

    /// Creates a client with a preconfigured HTTP client.
    ///
    /// Use this to configure TLS, proxies or authentication. Timeouts of the config are ignored.
    pub fn with_http_client(
        base_url: &str,
        config: ClientConfig,
        http: reqwest::Client,
    ) -> Result<Self, WriteError> {
        let url = Url::parse(base_url)?.join(&config.path)?;

        Ok(Self {
            http,
            url,
            config,
            encoder: Encoder::new(),
            compressed: Vec::new(),
            on_retry: None,
        })
    }

    /// Registers a callback that is invoked before every retry.
    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&WriteError) + Send + Sync + 'static,
    {
        self.on_retry = Some(Box::new(callback));
        self
    }

    /// Returns the URL requests are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the configuration of this client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Writes a message to the remote endpoint.
    ///
    /// On success, returns the stats accumulated over all attempts. On failure, the returned
    /// [`WriteFailure`] carries the same stats along with the error of the last attempt.
    ///
    /// The message is encoded before the first suspension point, so it does not need to outlive
    /// the call. Cancelling `cancel` aborts a running request or backoff delay immediately with
    /// [`WriteError::Cancelled`].
    pub fn write<'a>(
        &'a mut self,
        msg: &dyn WriteMessage,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = Result<WriteResponseStats, WriteFailure>> + use<'a> {
        let proto = msg.write_proto();
        let span = prw_log::info_span!("remote_write", endpoint = %self.url, %proto);
        let payload = span.in_scope(|| self.prepare(proto, msg));

        async move {
            let payload =
                payload.map_err(|error| WriteFailure::new(WriteResponseStats::default(), error))?;
            self.send(payload, cancel).await
        }
        .instrument(span)
    }

    fn prepare(&mut self, proto: WriteProto, msg: &dyn WriteMessage) -> Result<Payload, WriteError> {
        let encoded = self.encoder.encode(msg)?;
        let compressed = self.config.compression.compress(encoded, &mut self.compressed)?;

        Ok(Payload {
            proto,
            body: Bytes::copy_from_slice(compressed),
            baseline: msg.written_baseline(),
        })
    }

    async fn send(
        &mut self,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<WriteResponseStats, WriteFailure> {
        let mut backoff = RetryBackoff::new(&self.config.backoff);
        let mut stats = WriteResponseStats::default();

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.attempt(&payload, backoff.attempt()) => Some(result),
            };

            let Some((attempt_stats, outcome)) = result else {
                return Err(WriteFailure::new(stats, WriteError::Cancelled));
            };

            // Receivers may write data even if they fail the request.
            stats += attempt_stats;

            let (error, retry_after) = match outcome {
                Outcome::Success => return check_acceptance(&payload, stats),
                Outcome::Fatal(error) => return Err(WriteFailure::new(stats, error)),
                Outcome::Retry { error, retry_after } => (error, retry_after),
            };

            if !backoff.can_retry() {
                prw_log::debug!(
                    retries = backoff.attempt(),
                    elapsed = ?backoff.elapsed(),
                    "retry budget exhausted"
                );
                return Err(WriteFailure::new(stats, error));
            }

            let delay = backoff.next_backoff() + retry_after;
            prw_log::warn!(
                error = &error as &dyn std::error::Error,
                attempt = backoff.attempt(),
                ?delay,
                "failed to send write request, retrying after backoff"
            );

            if let Some(ref on_retry) = self.on_retry {
                on_retry(&error);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(WriteFailure::new(stats, WriteError::Cancelled));
                }
                _ = tokio::time::sleep(delay) => (),
            }
        }
    }

    async fn attempt(&self, payload: &Payload, attempt: u32) -> (WriteResponseStats, Outcome) {
        let mut request = self
            .http
            .post(self.url.clone())
            .header(CONTENT_ENCODING, self.config.compression.name())
            .header(CONTENT_TYPE, payload.proto.content_type())
            .header(VERSION_HEADER, payload.proto.version_header_value())
            .header(USER_AGENT, &self.config.user_agent)
            .body(payload.body.clone());

        if attempt > 0 {
            request = request.header(RETRY_ATTEMPT_HEADER, attempt);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                let outcome = Outcome::Retry {
                    error: WriteError::Transport(error),
                    retry_after: Duration::ZERO,
                };
                return (WriteResponseStats::default(), outcome);
            }
        };

        let stats = match WriteResponseStats::from_headers(response.headers()) {
            Ok(stats) => stats,
            Err(error) => {
                prw_log::warn!(
                    error = &error as &dyn std::error::Error,
                    "failed to parse write stats, keeping partial stats"
                );
                error.stats
            }
        };

        let status = response.status();
        if status.is_success() {
            return (stats, Outcome::Success);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(retry_after_duration)
            .unwrap_or_default();

        let body = read_excerpt(response).await;

        let outcome = if status.is_server_error() {
            Outcome::Retry {
                error: WriteError::ServerError { status, body },
                retry_after,
            }
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            let error = WriteError::RateLimited { body };
            if self.config.retry_on_rate_limit {
                Outcome::Retry { error, retry_after }
            } else {
                Outcome::Fatal(error)
            }
        } else {
            Outcome::Fatal(WriteError::Status { status, body })
        };

        (stats, outcome)
    }
}

/// Rejects 2.0 writes that were acknowledged without any confirmation.
///
/// A 2.0 receiver must report written data in response headers. A success without headers means
/// that the receiver most likely parsed the request as 1.0 and dropped all series. Requests that
/// are known to be empty legitimately write nothing.
fn check_acceptance(
    payload: &Payload,
    stats: WriteResponseStats,
) -> Result<WriteResponseStats, WriteFailure> {
    if payload.proto != WriteProto::V2 || stats.confirmed || !stats.no_data_written() {
        return Ok(stats);
    }

    if payload.baseline.is_some_and(|sent| sent.no_data_written()) {
        return Ok(stats);
    }

    let error = WriteError::LogicalAcceptance {
        sent: payload.baseline,
        written: stats,
    };
    Err(WriteFailure::new(stats, error))
}

/// Reads the beginning of a response body, without consuming more than needed.
async fn read_excerpt(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();

    while body.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(error) => {
                prw_log::debug!(
                    error = &error as &dyn std::error::Error,
                    "failed to read error response body"
                );
                break;
            }
        }
    }

    body_excerpt(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(proto: WriteProto, baseline: Option<WriteResponseStats>) -> Payload {
        Payload {
            proto,
            body: Bytes::new(),
            baseline,
        }
    }

    fn sent(samples: u64) -> Option<WriteResponseStats> {
        Some(WriteResponseStats {
            samples,
            ..Default::default()
        })
    }

    #[test]
    fn test_acceptance_v1_never_checked() {
        let stats = WriteResponseStats::default();
        assert!(check_acceptance(&payload(WriteProto::V1, sent(5)), stats).is_ok());
    }

    #[test]
    fn test_acceptance_v2_unconfirmed_empty() {
        let stats = WriteResponseStats::default();
        let failure = check_acceptance(&payload(WriteProto::V2, sent(5)), stats).unwrap_err();
        assert!(matches!(
            failure.error,
            WriteError::LogicalAcceptance { sent: Some(_), .. }
        ));

        let failure = check_acceptance(&payload(WriteProto::V2, None), stats).unwrap_err();
        assert!(matches!(
            failure.error,
            WriteError::LogicalAcceptance { sent: None, .. }
        ));
    }

    #[test]
    fn test_acceptance_v2_empty_request() {
        let stats = WriteResponseStats::default();
        assert!(check_acceptance(&payload(WriteProto::V2, sent(0)), stats).is_ok());
    }

    #[test]
    fn test_acceptance_v2_confirmed_zero() {
        let stats = WriteResponseStats {
            confirmed: true,
            ..Default::default()
        };
        assert!(check_acceptance(&payload(WriteProto::V2, sent(5)), stats).is_ok());
    }

    #[test]
    fn test_url_join() {
        let client = WriteClient::new("http://localhost:9090/", ClientConfig::default()).unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:9090/api/v1/write");

        let config = ClientConfig {
            path: "/receive".to_owned(),
            ..Default::default()
        };
        let client = WriteClient::new("http://localhost:9090/prefix/", config).unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:9090/receive");
    }

    #[test]
    fn test_invalid_url() {
        let result = WriteClient::new("not a url", ClientConfig::default());
        assert!(matches!(result, Err(WriteError::InvalidUrl(_))));
    }
}
