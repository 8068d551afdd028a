//! Transport error types.

use crate::port::PortError;
use thiserror::Error;

/// Errors reported by [`SerialTransport`](super::SerialTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// `open` was called on a transport that is already open.
    #[error("Port is already open")]
    AlreadyOpen,

    /// The operation requires an open port.
    #[error("Port is not open")]
    NotOpen,

    /// Baud rate must be non-zero.
    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// The device could not be opened or configured.
    #[error("Failed to open '{device}': {source}")]
    Open {
        device: String,
        #[source]
        source: PortError,
    },

    /// The device rejected a write or the write did not complete.
    #[error("Write failed: {0}")]
    Write(#[source] PortError),

    /// The device stopped accepting bytes partway through a write.
    #[error("Device accepted {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// The listener thread could not be started.
    #[error("Failed to start listener thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl TransportError {
    pub(crate) fn open(device: &str, source: PortError) -> Self {
        Self::Open {
            device: device.to_string(),
            source,
        }
    }
}
