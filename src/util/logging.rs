//! Structured logging setup
//!
//! Logs go to stderr so `printerdb extract` can print JSON on stdout. When
//! `RUST_LOG` is set it wins; otherwise the crate logs at the configured level
//! and HTTP internals are held at `warn`.
//!
//! ```no_run
//! use printerdb::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(source = "UVtools", "Downloaded machine table");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's own events
    pub level: Level,

    /// One JSON object per line, for CI log collectors
    pub use_json: bool,

    /// Include the module target (e.g., printerdb::extractors::orca)
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Reads `PRINTERDB_LOG_JSON`, keeping the given level
    pub fn from_env_with_level(level: Level) -> Self {
        let use_json = env::var("PRINTERDB_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Default::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        if env::var("RUST_LOG").is_ok() {
            return EnvFilter::from_default_env();
        }

        let directives = format!(
            "printerdb={},h2=warn,hyper=warn,hyper_util=warn,reqwest=warn",
            self.level
        );
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parses a log level, case-insensitively; unknown strings fall back to INFO
///
/// ```
/// use printerdb::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber; later calls are ignored
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.filter();

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Initializes from `PRINTERDB_LOG_LEVEL` and `PRINTERDB_LOG_JSON`
pub fn init_from_env() {
    let level_str = env::var("PRINTERDB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logging(LoggingConfig::from_env_with_level(parse_level(&level_str)));
}
