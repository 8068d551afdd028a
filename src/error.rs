use crate::config::ConfigError;
use crate::port::PortError;
use crate::transport::TransportError;
use std::fmt;

/// Top-level error for the command-line shell.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Transport(TransportError),
    Port(PortError),
    InvalidPayload(String),
    /// The listener on this device stopped reading.
    LinkLost(String),
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration problem: {e}"),
            Self::Transport(e) => write!(f, "Serial transport error: {e}"),
            Self::Port(e) => write!(f, "A serial port error occurred: {e}"),
            Self::InvalidPayload(details) => write!(f, "The payload is invalid: {details}"),
            Self::LinkLost(device) => write!(f, "Lost the serial listener on {device}"),
            Self::IoError(e) => write!(f, "An I/O error occurred: {e}"),
            Self::SerdeError(e) => write!(f, "A serialization error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::InvalidPayload(_) | Self::LinkLost(_) => None,
            Self::IoError(e) => Some(e),
            Self::SerdeError(e) => Some(e),
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Transport(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err)
    }
}

/// Parse hex like `c0 01 db`, `C001DB` or `0xc0,0x01`.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, AppError> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|tok| tok.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(AppError::InvalidPayload(format!(
            "odd number of hex digits in '{input}'"
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| AppError::InvalidPayload(format!("'{input}' is not valid hex")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_formats() {
        assert_eq!(parse_hex("c0 01 db").unwrap(), vec![0xC0, 0x01, 0xDB]);
        assert_eq!(parse_hex("C001DB").unwrap(), vec![0xC0, 0x01, 0xDB]);
        assert_eq!(parse_hex("0xc0,0x01").unwrap(), vec![0xC0, 0x01]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("abc"), Err(AppError::InvalidPayload(_))));
        assert!(matches!(parse_hex("zz"), Err(AppError::InvalidPayload(_))));
        assert!(matches!(parse_hex("é1"), Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn test_display() {
        let err = AppError::from(TransportError::NotOpen);
        assert_eq!(err.to_string(), "Serial transport error: Port is not open");
    }
}
