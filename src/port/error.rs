//! Port-specific error types.
//!
//! Kept separate from transport errors so a backend only has to describe what
//! went wrong with the device, not what the caller was doing at the time.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No data arrived within the configured timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The device reported a line error (framing, parity, overrun). The
    /// handle itself is still usable.
    #[error("Device error: {0}")]
    Device(String),

    /// The handle is gone: device unplugged or port closed underneath us.
    #[error("Device disconnected")]
    Disconnected,

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Create a Device error from a message.
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device(message.into())
    }

    /// Nothing arrived before the wait expired. Not an error for a poller.
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// The operation failed but the handle may be used again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Device(_) => true,
            Self::Io(e) => e.kind() == io::ErrorKind::Interrupted,
            _ => false,
        }
    }
}
