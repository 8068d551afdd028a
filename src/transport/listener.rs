//! Background reader thread.
//!
//! Each read waits at most the reader handle's timeout, so the stop flag is
//! observed within one poll interval of being raised.

use super::stats::Counters;
use crate::port::SerialPortAdapter;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Called once per received byte, on the listener thread.
pub type ByteCallback = Box<dyn FnMut(u8) + Send + 'static>;

/// Where received bytes go.
pub(crate) enum ByteSink {
    Callback(ByteCallback),
    Channel(SyncSender<u8>),
}

impl ByteSink {
    /// Hand over one byte. `false` means nobody is listening any more.
    fn deliver(&mut self, byte: u8, counters: &Counters) -> bool {
        match self {
            Self::Callback(callback) => {
                callback(byte);
                true
            }
            Self::Channel(tx) => match tx.try_send(byte) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    counters.record_dropped(1);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
        }
    }
}

/// Handle to a running listener thread. Dropping it stops and joins the thread.
pub(crate) struct Listener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    pub(crate) fn spawn(
        port: Box<dyn SerialPortAdapter>,
        sink: ByteSink,
        counters: Arc<Counters>,
        read_chunk: usize,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let name = format!("sliplink-rx:{}", port.name());

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || run(port, sink, &thread_stop, &counters, read_chunk))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Raise the stop flag and wait for the thread to exit.
    pub(crate) fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("serial listener thread panicked");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(
    mut port: Box<dyn SerialPortAdapter>,
    mut sink: ByteSink,
    stop: &AtomicBool,
    counters: &Counters,
    read_chunk: usize,
) {
    let mut buffer = vec![0u8; read_chunk.max(1)];
    info!(port = port.name(), "serial listener started");

    while !stop.load(Ordering::Acquire) {
        match port.read_bytes(&mut buffer) {
            Ok(n) => {
                counters.record_received(n);
                for (i, &byte) in buffer[..n].iter().enumerate() {
                    if stop.load(Ordering::Acquire) {
                        // Read but never handed over.
                        counters.record_dropped(n - i);
                        break;
                    }
                    if !sink.deliver(byte, counters) {
                        counters.record_dropped(n - i);
                        debug!(port = port.name(), "byte receiver dropped, listener exiting");
                        return;
                    }
                }
            }
            Err(e) if e.is_idle() => {}
            Err(e) if e.is_transient() => {
                counters.record_transient_error();
                warn!(port = port.name(), error = %e, "device error while listening");
            }
            Err(e) => {
                error!(port = port.name(), error = %e, "serial listener failed, no further input");
                return;
            }
        }
    }

    debug!(port = port.name(), "serial listener stopped");
}
