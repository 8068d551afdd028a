//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a device without hardware: the test side feeds
//! bytes and faults in, the code under test reads them out with real timeout
//! semantics, and everything written is logged for inspection. All handles
//! cloned from one port share the same device state.

use super::error::PortError;
use super::traits::{PortBackend, PortConfiguration, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fault to be reported by the next read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFault {
    /// A line error; the handle stays usable.
    Device(String),
    /// The read was interrupted; the handle stays usable.
    Interrupted,
    /// An unrecoverable I/O failure.
    Fatal,
}

impl ReadFault {
    fn into_error(self) -> PortError {
        match self {
            Self::Device(msg) => PortError::Device(msg),
            Self::Interrupted => PortError::Io(io::Error::from(io::ErrorKind::Interrupted)),
            Self::Fatal => PortError::Io(io::Error::new(io::ErrorKind::Other, "mock fatal read")),
        }
    }
}

/// Device state shared by every handle to one mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Faults reported, in order, ahead of queued data.
    read_faults: VecDeque<ReadFault>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Fail every write with an I/O error.
    fail_writes: bool,
    /// Accept at most this many bytes per write call.
    write_chunk_limit: Option<usize>,
    /// Reject opens through a backend.
    fail_open: bool,
    /// Configuration used by the most recent backend open.
    opened_with: Option<PortConfiguration>,
    /// Handles handed out by a backend or cloned from one and not yet dropped.
    open_handles: usize,
    /// Device has been unplugged.
    disconnected: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MockPortState>,
    readable: Condvar,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use sliplink::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello, World!");
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
pub struct MockSerialPort {
    name: String,
    /// Per-handle timeout, like a real duplicated descriptor.
    timeout: Duration,
    /// Counted in `open_handles`.
    counted: bool,
    shared: Arc<Shared>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: Duration::from_millis(10),
            counted: false,
            shared: Arc::new(Shared::default()),
        }
    }

    /// A handle tracked in `open_handles`, as handed to code under test.
    fn counted_handle(&self, timeout: Duration) -> Self {
        self.shared.state.lock().open_handles += 1;
        Self {
            name: self.name.clone(),
            timeout,
            counted: true,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.shared.state.lock();
        state.read_queue.extend(data);
        self.shared.readable.notify_all();
    }

    /// Make the next read fail with `fault`, ahead of any queued data.
    pub fn inject_read_fault(&self, fault: ReadFault) {
        let mut state = self.shared.state.lock();
        state.read_faults.push_back(fault);
        self.shared.readable.notify_all();
    }

    /// Simulate the device being unplugged. Every later read and write fails.
    pub fn disconnect(&self) {
        let mut state = self.shared.state.lock();
        state.disconnected = true;
        self.shared.readable.notify_all();
    }

    /// Get a copy of all data written to the port, one entry per write call.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.shared.state.lock().write_log.concat()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.state.lock().fail_writes = fail;
    }

    /// Accept at most `limit` bytes per write call; `Some(0)` accepts nothing.
    pub fn set_write_chunk_limit(&self, limit: Option<usize>) {
        self.shared.state.lock().write_chunk_limit = limit;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.shared.state.lock().fail_open = fail;
    }

    /// Configuration passed to the most recent backend open.
    pub fn opened_with(&self) -> Option<PortConfiguration> {
        self.shared.state.lock().opened_with.clone()
    }

    /// Handles to this port currently held by code under test.
    pub fn open_handles(&self) -> usize {
        self.shared.state.lock().open_handles
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.shared.state.lock().read_queue.len()
    }
}

impl Clone for MockSerialPort {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            timeout: self.timeout,
            counted: false,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if self.counted {
            let mut state = self.shared.state.lock();
            state.open_handles = state.open_handles.saturating_sub(1);
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();

        if state.disconnected {
            return Err(PortError::Disconnected);
        }
        if state.fail_writes {
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::Other,
                "mock write failure",
            )));
        }

        let accepted = state
            .write_chunk_limit
            .map_or(data.len(), |limit| limit.min(data.len()));
        state.write_log.push(data[..accepted].to_vec());

        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.shared.state.lock();

        loop {
            if state.disconnected {
                return Err(PortError::Disconnected);
            }
            if let Some(fault) = state.read_faults.pop_front() {
                return Err(fault.into_error());
            }
            if !state.read_queue.is_empty() {
                let mut bytes_read = 0;
                for slot in buffer.iter_mut() {
                    match state.read_queue.pop_front() {
                        Some(byte) => {
                            *slot = byte;
                            bytes_read += 1;
                        }
                        None => break,
                    }
                }
                return Ok(bytes_read);
            }
            if self
                .shared
                .readable
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.read_queue.is_empty()
                && state.read_faults.is_empty()
                && !state.disconnected
            {
                return Err(PortError::timeout(self.timeout));
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.timeout = timeout;
        Ok(())
    }

    fn try_clone_adapter(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        if self.shared.state.lock().disconnected {
            return Err(PortError::Disconnected);
        }
        Ok(Box::new(self.counted_handle(self.timeout)))
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Backend serving registered mock ports by device name.
#[derive(Debug, Default)]
pub struct MockBackend {
    ports: Mutex<HashMap<String, MockSerialPort>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and return the test-side handle to it.
    pub fn add_port(&self, name: impl Into<String>) -> MockSerialPort {
        let port = MockSerialPort::new(name);
        self.ports
            .lock()
            .insert(port.name().to_string(), port.clone());
        port
    }

    /// Names of registered devices, sorted.
    pub fn port_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ports.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl PortBackend for MockBackend {
    fn open(
        &self,
        device: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let ports = self.ports.lock();
        let port = ports.get(device).ok_or_else(|| PortError::not_found(device))?;
        {
            let mut state = port.shared.state.lock();
            if state.fail_open {
                return Err(PortError::config(format!("mock refused to open {device}")));
            }
            if state.disconnected {
                return Err(PortError::Disconnected);
            }
            state.opened_with = Some(config.clone());
        }
        Ok(Box::new(port.counted_handle(config.timeout)))
    }
}
