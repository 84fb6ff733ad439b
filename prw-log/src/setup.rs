use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

// Import CRATE_NAMES, which lists all crates in the workspace.
include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// Controls the log format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    #[default]
    Auto,

    /// Pretty printing with colors.
    ///
    /// ```text
    ///   INFO  prw_client::client: write succeeded
    /// ```
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2024-12-04T12:10:32.123Z  INFO prw_client::client: write succeeded
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2024-12-04T12:11:08.729716Z","level":"INFO","target":"prw_client::client","message":"write succeeded"}
    /// ```
    Json,
}

/// The logging level parsed from configuration files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Disables all logging.
    Off,
    /// Only errors.
    Error,
    /// Warnings and errors.
    Warn,
    /// The default level.
    #[default]
    Info,
    /// Debugging information.
    Debug,
    /// Full auxiliary information.
    Trace,
}

impl Level {
    /// Returns the tracing [`LevelFilter`] for this level.
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

/// Controls the logging system.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// The log level for the workspace crates.
    pub level: Level,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,
}

/// Builds the default filter directives for all of the workspace's crates.
fn default_filter(level: Level) -> EnvFilter {
    // Configure INFO as default for all third-party crates.
    let mut directives = String::from("info");

    // Hyper and reqwest are very spammy on INFO, so configure a higher warn level.
    directives.push_str(",hyper=warn,reqwest=warn");

    // Add all internal modules with the configured level.
    let level = level.level_filter();
    for name in CRATE_NAMES {
        directives.push_str(&format!(",{name}={level}"));
    }

    EnvFilter::new(directives)
}

/// Initialize the logging system.
///
/// The `RUST_LOG` environment variable takes precedence over the configured level. Calling this
/// function more than once has no effect.
///
/// # Example
///
/// ```
/// let log_config = prw_log::LogConfig {
///     format: prw_log::LogFormat::Json,
///     ..Default::default()
/// };
///
/// prw_log::init(&log_config);
/// ```
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config.level));

    let format: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.format, console::user_attended()) {
            (LogFormat::Auto, true) | (LogFormat::Pretty, _) => fmt::layer().pretty().boxed(),
            (LogFormat::Auto, false) | (LogFormat::Simplified, _) => {
                fmt::layer().with_ansi(false).boxed()
            }
            (LogFormat::Json, _) => fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .boxed(),
        };

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .try_init()
        .ok();
}
