//! SCPI definite-length arbitrary block codec.
//!
//! Instruments return binary data (screenshots, waveform samples) as
//! `#<L><N…N><payload>`: a `#` marker, one ASCII digit `L` giving the width
//! of the length field, `L` ASCII digits encoding the payload length `N`,
//! then `N` raw payload bytes. The same decoder serves every block-shaped
//! reply; only the caller's use of the payload differs.

use crate::error::BlockError;

/// Decode one definite-length block from the front of `buffer`.
///
/// Returns the payload slice and the total number of bytes consumed, so the
/// caller can locate any trailing data (typically the reply terminator). The
/// leading marker byte is not interpreted; the caller decides whether to
/// insist on `#`.
///
/// A short buffer yields [`BlockError::Truncated`] carrying the number of
/// bytes still missing; the caller can read that many more and retry.
pub fn decode_block(buffer: &[u8]) -> Result<(&[u8], usize), BlockError> {
    if buffer.len() < 2 {
        return Err(BlockError::Truncated {
            needed: 2 - buffer.len(),
        });
    }
    let digit_count = match (buffer[1] as char).to_digit(10) {
        Some(d) => d as usize,
        None => return Err(BlockError::InvalidLength),
    };
    let header_len = 2 + digit_count;
    if buffer.len() < header_len {
        return Err(BlockError::Truncated {
            needed: header_len - buffer.len(),
        });
    }
    let digits = &buffer[2..header_len];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(BlockError::InvalidLength);
    }
    let payload_len: usize = std::str::from_utf8(digits)
        .map_err(|_| BlockError::InvalidLength)?
        .parse()
        .map_err(|_| BlockError::InvalidLength)?;
    let total = header_len + payload_len;
    if buffer.len() < total {
        return Err(BlockError::Truncated {
            needed: total - buffer.len(),
        });
    }
    Ok((&buffer[header_len..total], total))
}

/// Encode `payload` as a definite-length block.
///
/// The inverse of [`decode_block`]; used when emulating an instrument (test
/// fixtures) or writing captures back out in instrument format.
pub fn encode_block(payload: &[u8]) -> Vec<u8> {
    let digits = payload.len().to_string();
    assert!(digits.len() <= 9, "block payload length exceeds nine digits");
    let mut block = Vec::with_capacity(2 + digits.len() + payload.len());
    block.push(b'#');
    block.push(b'0' + digits.len() as u8);
    block.extend_from_slice(digits.as_bytes());
    block.extend_from_slice(payload);
    block
}
