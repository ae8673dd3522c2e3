//! Relay-board frame codec.
//!
//! Both directions use the same layout: preamble byte, payload length byte,
//! payload, then a checksum byte equal to the sum of every preceding byte
//! modulo 256. A response that fails any validation step is discarded whole;
//! no partially-trusted payload ever reaches the caller.

use crate::constants::{FRAME_OVERHEAD, PREAMBLE};
use crate::error::ResponseError;

/// Sum of all bytes, modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Wrap a command payload into a ready-to-transmit frame.
///
/// # Panics
///
/// Panics if the payload exceeds 255 bytes; the length field is a single
/// byte and no board command comes anywhere near that size.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= u8::MAX as usize,
        "frame payload limited to 255 bytes"
    );
    let mut frame = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    frame.push(PREAMBLE);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame));
    frame
}

/// Validate an inbound frame and extract its payload.
///
/// Checks, in order: the handshake byte, the declared length against the
/// received byte count (skipped when at most one byte arrived), and the
/// trailing checksum. Boards answering a one-byte ACK with line noise fail
/// the checksum rather than the length check, matching hardware behavior.
pub fn decode_frame(data: &[u8]) -> Result<Vec<u8>, ResponseError> {
    let (&trailer, prefix) = match data.split_last() {
        Some(parts) => parts,
        None => return Err(ResponseError::Timeout),
    };
    if data[0] != PREAMBLE {
        return Err(ResponseError::BadHandshake { byte: data[0] });
    }
    if data.len() > 1 {
        let declared = data[1];
        let actual = data.len().saturating_sub(FRAME_OVERHEAD);
        if data.len() < FRAME_OVERHEAD || declared as usize != actual {
            return Err(ResponseError::LengthMismatch { declared, actual });
        }
    }
    let computed = checksum(prefix);
    if computed != trailer {
        return Err(ResponseError::BadChecksum {
            computed,
            received: trailer,
        });
    }
    Ok(if data.len() >= FRAME_OVERHEAD {
        data[2..data.len() - 1].to_vec()
    } else {
        Vec::new()
    })
}
