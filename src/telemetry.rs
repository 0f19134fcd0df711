//! Structured logging setup

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Whether to use JSON format (true) or text format (false)
    pub json_format: bool,
    /// The default log level if RUST_LOG is not set
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
        }
    }
}

impl From<&crate::Config> for LoggingConfig {
    fn from(config: &crate::Config) -> Self {
        Self {
            json_format: config.log_json,
            default_level: config.log_level,
        }
    }
}

/// Install the global subscriber
///
/// Later calls are ignored once a subscriber is set.
pub fn init_logging(config: LoggingConfig) {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref(), config.default_level);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_format {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// `RUST_LOG` directives when present and valid, the default level otherwise
fn log_filter(directives: Option<&str>, default_level: Level) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_overrides_default_level() {
        let filter = log_filter(Some("swapi_graphql=trace"), Level::INFO).to_string();
        assert!(filter.to_lowercase().contains("swapi_graphql=trace"));

        let filter = log_filter(None, Level::DEBUG).to_string();
        assert_eq!(filter.to_lowercase(), "debug");

        let filter = log_filter(Some("swapi_graphql=loud"), Level::WARN).to_string();
        assert_eq!(filter.to_lowercase(), "warn");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig {
            json_format: true,
            default_level: Level::DEBUG,
        });
    }
}
