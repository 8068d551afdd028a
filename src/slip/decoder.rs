use super::{END, ESC, ESC_END, ESC_ESC};
use tracing::debug;

/// Default accumulation capacity, sized for the largest frames the link
/// is expected to carry.
pub const DEFAULT_CAPACITY: usize = 32 * 1024;

/// Decoder mode. Every `END` byte flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderMode {
    /// Outside a frame; bytes are ignored.
    Serial,
    /// Inside a frame; bytes are unescaped into the buffer.
    Packet,
}

impl DecoderMode {
    fn toggled(self) -> Self {
        match self {
            Self::Serial => Self::Packet,
            Self::Packet => Self::Serial,
        }
    }
}

/// Byte-at-a-time SLIP decoder with a fixed-capacity buffer.
///
/// The decoder starts in [`DecoderMode::Serial`]. The first `END` opens a
/// frame; the next `END` closes it and hands back the payload. Because the
/// closing delimiter also flips the mode, back-to-back frames should be
/// sent as `END payload END END payload END`, which is exactly what
/// [`encode`](super::encode) produces per frame.
///
/// A frame whose payload would fill the buffer is dropped whole: the rest of
/// it is skipped up to its closing `END`, nothing is returned for it, and
/// [`dropped_frames`](Self::dropped_frames) is bumped.
#[derive(Debug, Clone)]
pub struct SlipDecoder {
    buffer: Box<[u8]>,
    len: usize,
    mode: DecoderMode,
    prev: u8,
    overflowed: bool,
    dropped: u64,
}

impl Default for SlipDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SlipDecoder {
    /// Create a decoder holding at most `capacity - 1` payload bytes per
    /// frame. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity.max(1)].into_boxed_slice(),
            len: 0,
            mode: DecoderMode::Serial,
            prev: 0,
            overflowed: false,
            dropped: 0,
        }
    }

    /// Feed one byte.
    ///
    /// Returns the finished payload when `byte` closes a frame. An empty
    /// slice means two delimiters arrived back to back; callers decide
    /// whether that is a keep-alive or noise.
    pub fn decode(&mut self, byte: u8) -> Option<&[u8]> {
        let mut finished = None;

        if self.mode == DecoderMode::Packet {
            if self.prev == ESC && byte == ESC_END {
                self.push(END);
            } else if self.prev == ESC && byte == ESC_ESC {
                self.push(ESC);
            } else if byte == END {
                if self.overflowed {
                    self.dropped += 1;
                    debug!(
                        capacity = self.buffer.len(),
                        dropped = self.dropped,
                        "SLIP frame exceeded buffer, dropped"
                    );
                } else {
                    finished = Some(self.len);
                }
            } else if byte != ESC {
                self.push(byte);
            }
        }

        self.prev = byte;

        if byte == END {
            self.mode = self.mode.toggled();
            self.len = 0;
            self.overflowed = false;
        }

        finished.map(move |len| &self.buffer[..len])
    }

    /// Feed a run of bytes, calling `on_frame` for every frame it completes.
    ///
    /// Returns the number of frames delivered.
    pub fn decode_slice<F>(&mut self, bytes: &[u8], mut on_frame: F) -> usize
    where
        F: FnMut(&[u8]),
    {
        let mut frames = 0;
        for &byte in bytes {
            if let Some(frame) = self.decode(byte) {
                on_frame(frame);
                frames += 1;
            }
        }
        frames
    }

    /// Frames discarded so far because they did not fit.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    pub fn mode(&self) -> DecoderMode {
        self.mode
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of payload bytes buffered for the frame in progress.
    pub fn pending_len(&self) -> usize {
        self.len
    }

    /// Return to the initial state. The drop counter is kept.
    pub fn reset(&mut self) {
        self.len = 0;
        self.mode = DecoderMode::Serial;
        self.prev = 0;
        self.overflowed = false;
    }

    fn push(&mut self, byte: u8) {
        if self.overflowed {
            return;
        }
        self.buffer[self.len] = byte;
        self.len += 1;
        if self.len >= self.buffer.len() {
            self.len = 0;
            self.overflowed = true;
        }
    }
}
