//! SLIP frames over a serial transport.
//!
//! `SlipLink` runs a [`SlipDecoder`] on the transport's listener thread and
//! queues completed frames in a bounded channel, so the consumer never runs on
//! the listener thread and never has to share the decoder.

use crate::port::{PortBackend, SystemBackend};
use crate::slip::{self, SlipDecoder, DEFAULT_CAPACITY};
use crate::transport::{SerialTransport, TransportError, TransportOptions, TransportStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TrySendError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

/// Framing knobs for a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Decoder buffer capacity; frames must be shorter than this.
    pub buffer_capacity: usize,
    /// Completed frames held for the consumer before new ones are dropped.
    pub frame_queue: usize,
    /// Queue zero-length frames (back-to-back delimiters) instead of
    /// discarding them.
    pub keep_empty_frames: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            frame_queue: 64,
            keep_empty_frames: false,
        }
    }
}

/// Frame counters since the most recent open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames handed to the queue.
    pub frames_received: u64,
    /// Frames discarded by the decoder for not fitting its buffer.
    pub frames_oversized: u64,
    /// Frames discarded because the queue was full.
    pub frames_dropped: u64,
    /// Empty frames seen and skipped.
    pub empty_frames: u64,
}

#[derive(Debug, Default)]
struct LinkCounters {
    frames_received: AtomicU64,
    frames_oversized: AtomicU64,
    frames_dropped: AtomicU64,
    empty_frames: AtomicU64,
}

impl LinkCounters {
    fn snapshot(&self) -> LinkStats {
        LinkStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_oversized: self.frames_oversized.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            empty_frames: self.empty_frames.load(Ordering::Relaxed),
        }
    }
}

/// Frame-level view of a serial line.
#[derive(Debug)]
pub struct SlipLink<B: PortBackend = SystemBackend> {
    transport: SerialTransport<B>,
    options: LinkOptions,
    frames: Option<Receiver<Frame>>,
    counters: Arc<LinkCounters>,
}

impl SlipLink<SystemBackend> {
    pub fn new(transport_options: TransportOptions, options: LinkOptions) -> Self {
        Self::with_transport(
            SerialTransport::with_backend(SystemBackend, transport_options),
            options,
        )
    }
}

impl<B: PortBackend> SlipLink<B> {
    pub fn with_transport(transport: SerialTransport<B>, options: LinkOptions) -> Self {
        Self {
            transport,
            options,
            frames: None,
            counters: Arc::new(LinkCounters::default()),
        }
    }

    /// Open `device` and start decoding.
    pub fn open(&mut self, device: &str, baud_rate: u32) -> Result<(), TransportError> {
        if self.transport.is_opened() {
            return Err(TransportError::AlreadyOpen);
        }

        let (tx, rx) = mpsc::sync_channel(self.options.frame_queue.max(1));
        let counters = Arc::new(LinkCounters::default());
        let sink_counters = Arc::clone(&counters);
        let mut decoder = SlipDecoder::new(self.options.buffer_capacity);
        let keep_empty = self.options.keep_empty_frames;
        let mut oversized_seen = 0;

        let callback = move |byte: u8| {
            let decoded = decoder.decode(byte).map(<[u8]>::to_vec);
            if decoder.dropped_frames() != oversized_seen {
                oversized_seen = decoder.dropped_frames();
                sink_counters
                    .frames_oversized
                    .store(oversized_seen, Ordering::Relaxed);
            }

            let Some(payload) = decoded else {
                return;
            };
            if payload.is_empty() && !keep_empty {
                sink_counters.empty_frames.fetch_add(1, Ordering::Relaxed);
                return;
            }

            let frame = Frame {
                payload,
                received_at: Utc::now(),
            };
            match tx.try_send(frame) {
                Ok(()) => {
                    sink_counters.frames_received.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Full(frame)) => {
                    sink_counters.frames_dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(len = frame.payload.len(), "frame queue full, frame dropped");
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        };

        self.transport.try_open(device, baud_rate, Box::new(callback))?;
        self.frames = Some(rx);
        self.counters = counters;
        Ok(())
    }

    /// Encode `payload` and write it as one frame.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let wire = slip::encode(payload);
        self.transport.try_write(&wire)?;
        debug!(payload_len = payload.len(), wire_len = wire.len(), "frame sent");
        Ok(())
    }

    /// Wait up to `timeout` for the next frame.
    ///
    /// `None` on timeout, when closed, or once the listener has stopped and
    /// the queue is drained.
    pub fn recv_frame(&self, timeout: Duration) -> Option<Frame> {
        let frames = self.frames.as_ref()?;
        match frames.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next frame if one is already queued.
    pub fn try_recv_frame(&self) -> Option<Frame> {
        self.frames.as_ref()?.try_recv().ok()
    }

    /// Close the transport. Frames still queued are discarded.
    pub fn close(&mut self) {
        self.transport.close();
        self.frames = None;
    }

    pub fn is_opened(&self) -> bool {
        self.transport.is_opened()
    }

    pub fn transport(&self) -> &SerialTransport<B> {
        &self.transport
    }

    pub fn transport_stats(&self) -> TransportStats {
        self.transport.stats()
    }

    pub fn stats(&self) -> LinkStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockBackend;

    #[test]
    fn test_closed_link() {
        let transport =
            SerialTransport::with_backend(MockBackend::new(), TransportOptions::default());
        let mut link = SlipLink::with_transport(transport, LinkOptions::default());
        assert!(!link.is_opened());
        assert!(link.try_recv_frame().is_none());
        assert!(link.recv_frame(Duration::from_millis(1)).is_none());
        assert!(matches!(
            link.send_frame(b"x"),
            Err(TransportError::NotOpen)
        ));
    }
}
