//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SLIPLINK";

/// Config file name
const CONFIG_FILE_NAME: &str = "sliplink.toml";

/// Application directory under the platform config dir
const APP_DIR: &str = "sliplink";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SLIPLINK_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Environment variables override file values; the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if let Err(e) = apply_env_overrides(&mut config).and_then(|()| config.validate()) {
            warn!(error = %e, "ignoring environment overrides, using built-in defaults");
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse `SLIPLINK_<key>` into `target` if it is set.
fn override_parsed<T: FromStr>(key: &str, target: &mut T, what: &str) -> ConfigResult<()> {
    let var = format!("{ENV_PREFIX}_{key}");
    if let Ok(val) = std::env::var(&var) {
        *target = val
            .trim()
            .parse()
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}")))?;
    }
    Ok(())
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SLIPLINK_<SECTION>_<KEY>`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    override_parsed(
        "SERIAL_DEFAULT_BAUD",
        &mut config.serial.default_baud,
        "baud rate",
    )?;
    override_parsed(
        "SERIAL_POLL_INTERVAL_MS",
        &mut config.serial.poll_interval_ms,
        "poll interval",
    )?;
    override_parsed(
        "SERIAL_WRITE_TIMEOUT_MS",
        &mut config.serial.write_timeout_ms,
        "write timeout",
    )?;
    override_parsed("SERIAL_READ_CHUNK", &mut config.serial.read_chunk, "chunk size")?;

    // SLIP overrides
    override_parsed(
        "SLIP_BUFFER_CAPACITY",
        &mut config.slip.buffer_capacity,
        "buffer capacity",
    )?;
    override_parsed("SLIP_FRAME_QUEUE", &mut config.slip.frame_queue, "queue size")?;
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_SLIP_KEEP_EMPTY_FRAMES")) {
        config.slip.keep_empty_frames = val.to_lowercase() == "true" || val == "1";
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{ENV_PREFIX}_LOGGING_FORMAT")) {
        config.logging.format = match val.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::env_parse(
                    format!("{ENV_PREFIX}_LOGGING_FORMAT"),
                    "Expected json, pretty or compact",
                ))
            }
        };
    }

    Ok(())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::sync::{Arc, Mutex};

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 115200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SLIPLINK_SERIAL_DEFAULT_BAUD", "9600");
        env::set_var("SLIPLINK_SLIP_BUFFER_CAPACITY", "512");
        env::set_var("SLIPLINK_LOGGING_FORMAT", "json");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 9600);
        assert_eq!(loader.config().slip.buffer_capacity, 512);
        assert_eq!(loader.config().logging.format, LogFormat::Json);

        env::remove_var("SLIPLINK_SERIAL_DEFAULT_BAUD");
        env::remove_var("SLIPLINK_SLIP_BUFFER_CAPACITY");
        env::remove_var("SLIPLINK_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("SLIPLINK_SERIAL_POLL_INTERVAL_MS", "soon");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { ref var, .. } if var == "SLIPLINK_SERIAL_POLL_INTERVAL_MS"));

        env::remove_var("SLIPLINK_SERIAL_POLL_INTERVAL_MS");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    #[serial]
    fn test_with_defaults_logs_discarded_overrides() {
        env::set_var("SLIPLINK_SERIAL_DEFAULT_BAUD", "57600");
        env::set_var("SLIPLINK_SERIAL_POLL_INTERVAL_MS", "soon");

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let loader = tracing::subscriber::with_default(subscriber, ConfigLoader::with_defaults);

        env::remove_var("SLIPLINK_SERIAL_DEFAULT_BAUD");
        env::remove_var("SLIPLINK_SERIAL_POLL_INTERVAL_MS");

        // Falls back to defaults instead of failing, dropping the good override too.
        assert_eq!(loader.config().serial.poll_interval_ms, 10);
        assert_eq!(loader.config().serial.default_baud, 115200);

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("SLIPLINK_SERIAL_POLL_INTERVAL_MS"), "{output}");
    }

    #[test]
    #[serial]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config.serial.default_baud = 57600;
        loader.config.slip.frame_queue = 3;
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().serial.default_baud, 57600);
        assert_eq!(reloaded.config().slip.frame_queue, 3);
        assert_eq!(reloaded.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[slip]\nbuffer_capacity = 1\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from(&path),
            Err(ConfigError::ValidationError { .. })
        ));

        std::fs::write(&path, "[serial\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let err = ConfigLoader::load_from("/nonexistent/sliplink.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
