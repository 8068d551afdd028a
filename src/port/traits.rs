//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` is one open device handle; `PortBackend` knows how to
//! open one. The transport only ever talks to these two traits, so the real
//! `serialport` backend and the in-memory mock are interchangeable.

use super::error::PortError;
use std::time::Duration;

/// Line settings for opening a device.
///
/// Framing is always 8 data bits, no parity, 1 stop bit and no flow
/// control; only the rate and the per-call timeout vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read/write timeout.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::eight_n_one(9600, Duration::from_millis(10))
    }
}

impl PortConfiguration {
    /// 8 data bits, no parity, 1 stop bit, no flow control.
    pub fn eight_n_one(baud_rate: u32, timeout: Duration) -> Self {
        Self { baud_rate, timeout }
    }
}

/// Trait for serial port I/O operations.
///
/// Reads are expected to wait at most the configured timeout and report an
/// idle wait as an error for which [`PortError::is_idle`] holds.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the read/write timeout for this handle.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Open a second handle to the same device.
    ///
    /// The transport reads on one handle from its listener thread and writes
    /// on the other from the caller's thread.
    fn try_clone_adapter(&self) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

/// Something that can open serial devices.
pub trait PortBackend: Send + Sync + std::fmt::Debug {
    /// Open `device` and apply `config`.
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

impl<B: PortBackend + ?Sized> PortBackend for std::sync::Arc<B> {
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        (**self).open(device, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = PortConfiguration::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_millis(10));
    }

    #[test]
    fn test_eight_n_one() {
        let config = PortConfiguration::eight_n_one(115200, Duration::from_millis(5));
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timeout, Duration::from_millis(5));
    }
}
