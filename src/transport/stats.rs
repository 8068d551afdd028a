use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between a transport and its listener thread.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    bytes_received: AtomicU64,
    bytes_written: AtomicU64,
    transient_errors: AtomicU64,
    bytes_dropped: AtomicU64,
}

impl Counters {
    pub(crate) fn record_received(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self, n: usize) {
        self.bytes_written.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, n: usize) {
        self.bytes_dropped.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.bytes_received.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.transient_errors.store(0, Ordering::Relaxed);
        self.bytes_dropped.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransportStats {
        TransportStats {
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Traffic counters since the most recent successful open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStats {
    /// Bytes read from the device.
    pub bytes_received: u64,
    /// Bytes accepted by the device.
    pub bytes_written: u64,
    /// Device errors the listener logged and skipped.
    pub transient_errors: u64,
    /// Bytes read but never handed over: the receive channel was full, or
    /// the transport closed or the receiver went away partway through a read.
    pub bytes_dropped: u64,
}
