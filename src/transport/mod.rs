//! Threaded serial transport.
//!
//! `SerialTransport` owns one open device and one listener thread. The state is
//! either `Closed` or `Open` with both the write handle and the listener, so a
//! transport can never be open without a listener or hold a listener while
//! closed.
//!
//! ```no_run
//! use sliplink::SerialTransport;
//!
//! let mut transport = SerialTransport::new();
//! if transport.open("/dev/ttyUSB0", 115200, Box::new(|byte: u8| println!("{byte:#04x}"))) {
//!     transport.write(&[0xC0, 0x01, 0xC0]);
//!     transport.close();
//! }
//! ```

mod error;
mod listener;
mod stats;

pub use error::TransportError;
pub use listener::ByteCallback;
pub use stats::TransportStats;

use crate::port::{PortBackend, PortConfiguration, PortError, SerialPortAdapter, SystemBackend};
use listener::{ByteSink, Listener};
use stats::Counters;
use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Timing knobs for a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Longest single wait of the listener. Bounds how long `close` takes.
    pub poll_interval: Duration,
    /// Longest wait for the device to accept one write call.
    pub write_timeout: Duration,
    /// Bytes requested per read. Delivery is still one byte per callback.
    pub read_chunk: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            write_timeout: Duration::from_secs(1),
            read_chunk: 64,
        }
    }
}

enum TransportState {
    Closed,
    Open(OpenPort),
}

struct OpenPort {
    device: String,
    baud_rate: u32,
    writer: Box<dyn SerialPortAdapter>,
    listener: Listener,
}

/// A serial device plus the thread that reads from it.
pub struct SerialTransport<B: PortBackend = SystemBackend> {
    backend: B,
    options: TransportOptions,
    state: TransportState,
    counters: Arc<Counters>,
}

impl SerialTransport<SystemBackend> {
    /// Transport over real devices with default options.
    pub fn new() -> Self {
        Self::with_backend(SystemBackend, TransportOptions::default())
    }
}

impl Default for SerialTransport<SystemBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: PortBackend> SerialTransport<B> {
    pub fn with_backend(backend: B, options: TransportOptions) -> Self {
        Self {
            backend,
            options,
            state: TransportState::Closed,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Open `device` at `baud_rate` (8N1) and start delivering every
    /// received byte to `callback` from the listener thread.
    ///
    /// Returns `false` if the transport is already open or the device could
    /// not be opened; the reason is logged.
    pub fn open(&mut self, device: &str, baud_rate: u32, callback: ByteCallback) -> bool {
        match self.try_open(device, baud_rate, callback) {
            Ok(()) => true,
            Err(TransportError::AlreadyOpen) => {
                warn!(device, "open ignored, transport already open");
                false
            }
            Err(e) => {
                error!(device, error = %e, "failed to open serial transport");
                false
            }
        }
    }

    /// Like [`open`](Self::open), reporting why it failed.
    pub fn try_open(
        &mut self,
        device: &str,
        baud_rate: u32,
        callback: ByteCallback,
    ) -> Result<(), TransportError> {
        self.start(device, baud_rate, ByteSink::Callback(callback))
    }

    /// Open `device` and deliver received bytes through a bounded channel.
    ///
    /// When the channel is full, new bytes are dropped and counted in
    /// [`TransportStats::bytes_dropped`]; the listener never blocks on the
    /// consumer. Dropping the receiver stops the listener.
    pub fn open_channel(
        &mut self,
        device: &str,
        baud_rate: u32,
        capacity: usize,
    ) -> Result<Receiver<u8>, TransportError> {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        self.start(device, baud_rate, ByteSink::Channel(tx))?;
        Ok(rx)
    }

    fn start(&mut self, device: &str, baud_rate: u32, sink: ByteSink) -> Result<(), TransportError> {
        if self.is_opened() {
            return Err(TransportError::AlreadyOpen);
        }
        if baud_rate == 0 {
            return Err(TransportError::InvalidBaudRate(baud_rate));
        }

        let config = PortConfiguration::eight_n_one(baud_rate, self.options.write_timeout);
        let writer = self
            .backend
            .open(device, &config)
            .map_err(|e| TransportError::open(device, e))?;
        let mut reader = writer
            .try_clone_adapter()
            .map_err(|e| TransportError::open(device, e))?;
        reader
            .set_timeout(self.options.poll_interval)
            .map_err(|e| TransportError::open(device, e))?;

        self.counters.reset();
        let listener = Listener::spawn(
            reader,
            sink,
            Arc::clone(&self.counters),
            self.options.read_chunk,
        )
        .map_err(TransportError::Spawn)?;

        self.state = TransportState::Open(OpenPort {
            device: device.to_string(),
            baud_rate,
            writer,
            listener,
        });
        info!(device, baud_rate, "serial transport opened");
        Ok(())
    }

    /// Stop the listener, wait for it to exit, then release the device.
    ///
    /// No callback runs after this returns. Closing a closed transport does
    /// nothing.
    pub fn close(&mut self) {
        let TransportState::Open(open) = std::mem::replace(&mut self.state, TransportState::Closed)
        else {
            return;
        };

        let OpenPort {
            device,
            writer,
            listener,
            ..
        } = open;
        listener.shutdown();
        drop(writer);
        info!(device = %device, "serial transport closed");
    }

    /// Write all of `bytes`, blocking until the device has accepted them.
    ///
    /// Returns `false` if the port is closed or the write failed; the reason
    /// is logged.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        match self.try_write(bytes) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, len = bytes.len(), "serial write failed");
                false
            }
        }
    }

    pub fn write_byte(&mut self, byte: u8) -> bool {
        self.write(&[byte])
    }

    /// Like [`write`](Self::write), reporting why it failed.
    pub fn try_write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let TransportState::Open(open) = &mut self.state else {
            return Err(TransportError::NotOpen);
        };

        let mut written = 0;
        while written < bytes.len() {
            match open.writer.write_bytes(&bytes[written..]) {
                Ok(0) => {
                    return Err(TransportError::ShortWrite {
                        written,
                        expected: bytes.len(),
                    })
                }
                Ok(n) => written += n,
                Err(PortError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(TransportError::Write(e)),
            }
        }

        self.counters.record_written(written);
        debug!(len = written, "serial write complete");
        Ok(())
    }

    pub fn is_opened(&self) -> bool {
        matches!(self.state, TransportState::Open(_))
    }

    /// Whether the listener thread is still reading. Stays `true` for the
    /// whole open lifetime unless the device failed underneath it.
    pub fn is_listening(&self) -> bool {
        match &self.state {
            TransportState::Open(open) => open.listener.is_running(),
            TransportState::Closed => false,
        }
    }

    pub fn device(&self) -> Option<&str> {
        match &self.state {
            TransportState::Open(open) => Some(&open.device),
            TransportState::Closed => None,
        }
    }

    pub fn baud_rate(&self) -> Option<u32> {
        match &self.state {
            TransportState::Open(open) => Some(open.baud_rate),
            TransportState::Closed => None,
        }
    }

    pub fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}

impl<B: PortBackend> Drop for SerialTransport<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: PortBackend> fmt::Debug for SerialTransport<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("backend", &self.backend)
            .field("device", &self.device())
            .field("baud_rate", &self.baud_rate())
            .field("listening", &self.is_listening())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockBackend;

    fn options() -> TransportOptions {
        TransportOptions {
            poll_interval: Duration::from_millis(2),
            write_timeout: Duration::from_millis(50),
            read_chunk: 8,
        }
    }

    #[test]
    fn test_closed_by_default() {
        let transport = SerialTransport::with_backend(MockBackend::new(), options());
        assert!(!transport.is_opened());
        assert!(!transport.is_listening());
        assert_eq!(transport.device(), None);
        assert_eq!(transport.stats(), TransportStats::default());
    }

    #[test]
    fn test_zero_baud_rejected() {
        let backend = MockBackend::new();
        backend.add_port("MOCK0");
        let mut transport = SerialTransport::with_backend(backend, options());
        let err = transport
            .try_open("MOCK0", 0, Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidBaudRate(0)));
        assert!(!transport.is_opened());
    }

    #[test]
    fn test_write_when_closed() {
        let mut transport = SerialTransport::with_backend(MockBackend::new(), options());
        assert!(matches!(
            transport.try_write(b"x"),
            Err(TransportError::NotOpen)
        ));
        assert!(!transport.write_byte(0x01));
    }

    #[test]
    fn test_port_configured_eight_n_one() {
        let backend = MockBackend::new();
        let port = backend.add_port("MOCK0");
        let mut transport = SerialTransport::with_backend(backend, options());

        assert!(transport.open("MOCK0", 115200, Box::new(|_| {})));
        let config = port.opened_with().unwrap();
        assert_eq!(config, PortConfiguration::eight_n_one(115200, Duration::from_millis(50)));
        assert_eq!(transport.device(), Some("MOCK0"));
        assert_eq!(transport.baud_rate(), Some(115200));
    }
}
