//! Shared test utilities for transport and link tests.

#![allow(dead_code)]

use sliplink::{MockBackend, MockSerialPort, SerialTransport, TransportOptions};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options with a short poll interval so tests close quickly.
pub fn fast_options() -> TransportOptions {
    TransportOptions {
        poll_interval: Duration::from_millis(2),
        write_timeout: Duration::from_millis(100),
        read_chunk: 4,
    }
}

/// A transport over a mock backend with one registered device.
pub fn mock_transport(device: &str) -> (SerialTransport<Arc<MockBackend>>, MockSerialPort) {
    let backend = Arc::new(MockBackend::new());
    let port = backend.add_port(device);
    (SerialTransport::with_backend(backend, fast_options()), port)
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
