use std::time::Duration;

use prw_protocol::Compression;
use serde::{Deserialize, Serialize};

/// Retry policy of a [`WriteClient`](crate::WriteClient).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds.
    pub min_delay_ms: u64,
    /// Upper bound of the delay between retries in milliseconds.
    ///
    /// A `Retry-After` hint from the server is added on top of this delay.
    pub max_delay_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
}

impl BackoffConfig {
    /// Returns the delay before the first retry.
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Returns the upper bound of the backoff delay.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 10_000,
            max_retries: 10,
        }
    }
}

/// Configuration of a [`WriteClient`](crate::WriteClient).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path of the write endpoint, resolved against the base URL of the client.
    pub path: String,
    /// Compression of request bodies.
    pub compression: Compression,
    /// Retries requests rejected with `429 Too Many Requests`.
    pub retry_on_rate_limit: bool,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Timeout of a single HTTP request in seconds, including reading the response.
    pub timeout_secs: u64,
    /// Timeout for establishing a connection in seconds.
    pub connection_timeout_secs: u64,
    /// Retry policy.
    pub backoff: BackoffConfig,
}

impl ClientConfig {
    /// Returns the timeout of a single HTTP request.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the timeout for establishing a connection.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            path: "api/v1/write".to_owned(),
            compression: Compression::Snappy,
            retry_on_rate_limit: true,
            user_agent: concat!("prw-client/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout_secs: 60,
            connection_timeout_secs: 3,
            backoff: BackoffConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.path, "api/v1/write");
        assert!(config.retry_on_rate_limit);
        assert_eq!(config.backoff.min_delay(), Duration::from_secs(1));
        assert_eq!(config.backoff.max_delay(), Duration::from_secs(10));
        assert_eq!(config.backoff.max_retries, 10);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
path: /receive
retry_on_rate_limit: false
backoff:
  max_retries: 3
"#;
        let config: ClientConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            config,
            ClientConfig {
                path: "/receive".to_owned(),
                retry_on_rate_limit: false,
                backoff: BackoffConfig {
                    max_retries: 3,
                    ..Default::default()
                },
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_unknown_compression_rejected() {
        let result = serde_yaml::from_str::<ClientConfig>("compression: gzip");
        assert!(result.is_err());
    }
}
