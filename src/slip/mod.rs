//! SLIP (RFC 1055) framing.
//!
//! A frame on the wire is `END <escaped payload> END`. Inside the payload,
//! `END` becomes `ESC ESC_END` and `ESC` becomes `ESC ESC_ESC`; every other
//! byte is sent as-is.
//!
//! ```
//! use sliplink::slip::{encode, SlipDecoder};
//!
//! let wire = encode(&[0xC0, 0x01, 0xDB]);
//! assert_eq!(wire, [0xC0, 0xDB, 0xDC, 0x01, 0xDB, 0xDD, 0xC0]);
//!
//! let mut decoder = SlipDecoder::new(64);
//! let mut frames = Vec::new();
//! decoder.decode_slice(&wire, |frame| frames.push(frame.to_vec()));
//! assert_eq!(frames, vec![vec![0xC0, 0x01, 0xDB]]);
//! ```

mod decoder;
mod encoder;

pub use decoder::{DecoderMode, SlipDecoder, DEFAULT_CAPACITY};
pub use encoder::{encode, encode_into, encoded_len};

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape byte.
pub const ESC: u8 = 0xDB;
/// Escaped `END` (follows `ESC`).
pub const ESC_END: u8 = 0xDC;
/// Escaped `ESC` (follows `ESC`).
pub const ESC_ESC: u8 = 0xDD;
