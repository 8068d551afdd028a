//! Tracing subscriber setup for the command-line shell.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build the level filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Logs go to stderr so frame output on
/// stdout stays machine-readable.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &LoggingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn with_rust_log<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
        let saved = env::var("RUST_LOG").ok();
        match value {
            Some(v) => env::set_var("RUST_LOG", v),
            None => env::remove_var("RUST_LOG"),
        }
        let result = f();
        match saved {
            Some(v) => env::set_var("RUST_LOG", v),
            None => env::remove_var("RUST_LOG"),
        }
        result
    }

    fn logging(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: LogFormat::Compact,
        }
    }

    #[test]
    #[serial]
    fn test_configured_level_used() {
        let filter = with_rust_log(None, || env_filter(&logging("debug")));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_level_falls_back_to_info() {
        let filter = with_rust_log(None, || env_filter(&logging("sliplink=loud")));
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    #[serial]
    fn test_rust_log_wins() {
        let filter = with_rust_log(Some("sliplink=trace"), || env_filter(&logging("warn")));
        assert_eq!(filter.to_string(), "sliplink=trace");
    }
}
