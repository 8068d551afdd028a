//! Configuration schema definitions.
//!
//! Every section has serde defaults, so a file only needs the keys it changes.

use super::error::{ConfigError, ConfigResult};
use crate::link::LinkOptions;
use crate::port::device_path;
use crate::transport::TransportOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Smallest decoder buffer that can still carry a useful frame.
const MIN_BUFFER_CAPACITY: usize = 4;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// SLIP framing configuration
    pub slip: SlipConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the transport or decoder cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation(
                "serial.default_baud",
                "must be greater than zero",
            ));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "serial.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.serial.read_chunk == 0 {
            return Err(ConfigError::validation(
                "serial.read_chunk",
                "must be greater than zero",
            ));
        }
        if self.slip.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(ConfigError::validation(
                "slip.buffer_capacity",
                format!("must be at least {MIN_BUFFER_CAPACITY}"),
            ));
        }
        if self.slip.frame_queue == 0 {
            return Err(ConfigError::validation(
                "slip.frame_queue",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            poll_interval: self.serial.poll_interval(),
            write_timeout: self.serial.write_timeout(),
            read_chunk: self.serial.read_chunk,
        }
    }

    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            buffer_capacity: self.slip.buffer_capacity,
            frame_queue: self.slip.frame_queue,
            keep_empty_frames: self.slip.keep_empty_frames,
        }
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate used when none is given on the command line
    pub default_baud: u32,
    /// Longest single wait of the listener thread, in milliseconds
    pub poll_interval_ms: u64,
    /// Longest wait for one write call, in milliseconds
    pub write_timeout_ms: u64,
    /// Bytes requested per read
    pub read_chunk: usize,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_baud: 115200,
            poll_interval_ms: 10,
            write_timeout_ms: 1000,
            read_chunk: 64,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Resolve aliases, then qualify with the platform device prefix.
    pub fn device_for(&self, name: &str) -> String {
        device_path(&self.resolve_port(name))
    }
}

/// SLIP framing configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipConfig {
    /// Decoder buffer size in bytes
    pub buffer_capacity: usize,
    /// Decoded frames queued for the consumer
    pub frame_queue: usize,
    /// Deliver empty frames instead of discarding them
    pub keep_empty_frames: bool,
}

impl Default for SlipConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: crate::slip::DEFAULT_CAPACITY,
            frame_queue: 64,
            keep_empty_frames: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.default_baud, 115200);
        assert_eq!(config.slip.buffer_capacity, 32 * 1024);
        assert!(!config.slip.keep_empty_frames);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("radio".to_string(), "/dev/ttyACM0".to_string());

        assert_eq!(config.resolve_port("radio"), "/dev/ttyACM0");
        assert_eq!(config.resolve_port("COM5"), "COM5");
        assert_eq!(config.device_for("radio"), device_path("/dev/ttyACM0"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[slip]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            default_baud = 9600

            [slip]
            buffer_capacity = 256
            keep_empty_frames = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.default_baud, 9600);
        assert_eq!(config.slip.buffer_capacity, 256);
        assert!(config.slip.keep_empty_frames);
        // Defaults should still work
        assert_eq!(config.serial.poll_interval_ms, 10);
        assert_eq!(config.slip.frame_queue, 64);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.slip.buffer_capacity = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { key, .. }) if key == "slip.buffer_capacity"
        ));

        let mut config = Config::default();
        config.serial.default_baud = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.serial.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = Config::default();
        config.serial.poll_interval_ms = 25;
        config.serial.write_timeout_ms = 300;
        config.slip.frame_queue = 8;

        let transport = config.transport_options();
        assert_eq!(transport.poll_interval, Duration::from_millis(25));
        assert_eq!(transport.write_timeout, Duration::from_millis(300));

        let link = config.link_options();
        assert_eq!(link.frame_queue, 8);
        assert_eq!(link.buffer_capacity, 32 * 1024);
    }
}
