use super::{END, ESC, ESC_END, ESC_ESC};

/// SLIP-encode `payload` into a new buffer, delimiters included.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(payload));
    encode_into(payload, &mut out);
    out
}

/// SLIP-encode `payload`, appending to `out`.
///
/// Lets a caller reuse one output buffer across frames.
pub fn encode_into(payload: &[u8], out: &mut Vec<u8>) {
    out.reserve(encoded_len(payload));
    out.push(END);
    for &byte in payload {
        match byte {
            END => out.extend_from_slice(&[ESC, ESC_END]),
            ESC => out.extend_from_slice(&[ESC, ESC_ESC]),
            _ => out.push(byte),
        }
    }
    out.push(END);
}

/// Number of bytes `encode(payload)` produces.
pub fn encoded_len(payload: &[u8]) -> usize {
    let escaped = payload.iter().filter(|&&b| b == END || b == ESC).count();
    payload.len() + escaped + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_payload_is_two_delimiters() {
        assert_eq!(encode(&[]), vec![END, END]);
    }

    #[test]
    fn plain_bytes_pass_through() {
        assert_eq!(encode(&[0x01, 0x02, 0x03]), vec![END, 0x01, 0x02, 0x03, END]);
    }

    #[test]
    fn escapes_end_and_esc() {
        const DATA: [u8; 3] = [0xC0, 0x01, 0xDB];
        const EXPECTED: [u8; 7] = [0xC0, 0xDB, 0xDC, 0x01, 0xDB, 0xDD, 0xC0];
        assert_eq!(encode(&DATA), EXPECTED.to_vec());
    }

    /// ESC_END and ESC_ESC are only special after ESC.
    #[test]
    fn escape_suffixes_alone_are_not_escaped() {
        assert_eq!(encode(&[ESC_END, ESC_ESC]), vec![END, ESC_END, ESC_ESC, END]);
    }

    #[test]
    fn encode_into_appends() {
        let mut out = vec![0xAA];
        encode_into(&[0x01], &mut out);
        encode_into(&[END], &mut out);
        assert_eq!(out, vec![0xAA, END, 0x01, END, END, ESC, ESC_END, END]);
    }

    #[test]
    fn encoded_len_matches_output() {
        let payload = [END, ESC, 0x00, END, 0x7F];
        assert_eq!(encoded_len(&payload), encode(&payload).len());
        assert_eq!(encoded_len(&[]), 2);
    }
}
