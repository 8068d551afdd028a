//! Configuration module for sliplink.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SLIPLINK_CONFIG` environment variable (explicit path)
//! 2. `./sliplink.toml` (current directory)
//! 3. `~/.config/sliplink/sliplink.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\sliplink\sliplink.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SLIPLINK_<SECTION>_<KEY>`, for example
//! `SLIPLINK_SERIAL_DEFAULT_BAUD=9600` or `SLIPLINK_SLIP_BUFFER_CAPACITY=4096`.
//!
//! # Example
//!
//! ```rust,ignore
//! use sliplink::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Default baud: {}", config.serial.default_baud);
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, SlipConfig};
