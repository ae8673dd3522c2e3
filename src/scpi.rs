//! SCPI instrument collaborator seam.
//!
//! Instrument connections (VXI-11, raw socket, USB-TMC) differ in plumbing
//! but expose the same three operations. The retrieval paths in this crate
//! depend only on this trait, so tests drive them with scripted fixtures.

use crate::error::{ProtocolError, Result};

/// SCPI sentinel for a value the instrument cannot produce.
pub const MASKED_VALUE: f64 = 9.9e37;

/// Command/query interface a SCPI instrument connection provides.
pub trait ScpiLink {
    /// Send a command with no reply.
    fn write(&mut self, command: &str) -> Result<()>;

    /// Send a query and return its ASCII reply.
    fn ask(&mut self, command: &str) -> Result<String>;

    /// Send a query whose reply is raw bytes (block transfers), reading up
    /// to `max_len` bytes.
    fn ask_raw(&mut self, command: &str, max_len: usize) -> Result<Vec<u8>>;
}

/// Parse a scalar reply, mapping the instrument's 9.9e37 "invalid" sentinel
/// to `None`.
pub fn masked_float(reply: &str) -> Result<Option<f64>> {
    let value: f64 = reply
        .trim()
        .parse()
        .map_err(|_| ProtocolError::Parse(format!("bad float reply {reply:?}")))?;
    Ok(if value == MASKED_VALUE { None } else { Some(value) })
}
