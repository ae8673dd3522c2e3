//! Error types for instrument and relay-board operations.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from decoding a SCPI definite-length arbitrary block.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// Buffer ends before the declared payload does. `needed` is how many
    /// more bytes the caller must supply before decoding can succeed.
    #[error("truncated block: {needed} more bytes required")]
    Truncated {
        /// Additional bytes required to complete the block
        needed: usize,
    },

    /// Length header bytes are not ASCII decimal digits
    #[error("invalid block length header")]
    InvalidLength,
}

/// Errors from validating a relay-board response frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    /// Fewer bytes arrived than the command's response requires
    #[error("response timed out")]
    Timeout,

    /// First response byte was not the handshake byte
    #[error("bad handshake byte {byte:#04x}")]
    BadHandshake {
        /// Byte received in place of the handshake
        byte: u8,
    },

    /// Declared length byte disagrees with the received byte count
    #[error("declared length {declared} does not match {actual} received payload bytes")]
    LengthMismatch {
        /// Length byte carried by the frame
        declared: u8,
        /// Payload bytes actually received
        actual: usize,
    },

    /// Trailing checksum byte does not cover the preceding bytes
    #[error("checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    BadChecksum {
        /// Checksum computed over the received bytes
        computed: u8,
        /// Checksum byte carried by the frame
        received: u8,
    },
}

/// Error type covering all instrument and relay-board failures.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Serial port communication error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Block transfer decoding failed
    #[error("block decode failed: {0}")]
    Block(#[from] BlockError),

    /// Relay response frame was rejected
    #[error("relay response rejected: {0}")]
    Response(#[from] ResponseError),

    /// Argument falls outside the range the hardware accepts
    #[error("{name} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        /// Name of the offending argument
        name: &'static str,
        /// Value supplied by the caller
        value: i64,
        /// Smallest accepted value
        min: i64,
        /// Largest accepted value
        max: i64,
    },

    /// Decoded payload length disagrees with the preamble's point count
    #[error("sample count {actual} does not match preamble point count {expected}")]
    PointCountMismatch {
        /// Point count reported by the waveform preamble
        expected: usize,
        /// Samples actually decoded
        actual: usize,
    },

    /// Reply text could not be parsed
    #[error("parse error: {0}")]
    Parse(String),
}
