//! Wire-protocol constants for relay-board and instrument communication.

/// Frame preamble byte; doubles as the response handshake byte.
pub const PREAMBLE: u8 = 0xAA;

/// Lead byte selecting the ProXR API command set.
pub const API_CMD: u8 = 0xFE;

/// Non-payload bytes in a relay frame: preamble, length, checksum.
pub const FRAME_OVERHEAD: usize = 3;

/// Default response deadline, matching the boards' factory communication timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Default baud rate for relay boards on a serial line.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Upper bound on a single raw block read from an instrument.
pub const BLOCK_READ_LEN: usize = 100_000;

/// Points in a full-screen waveform capture (12 divisions, 100 points each).
pub const FULL_SCREEN_POINTS: usize = 1200;

/// Most points a single `:WAVeform:DATA?` batch can return in raw mode.
pub const MAX_POINTS_PER_BATCH: usize = 250_000;

/// Number of relays addressable within one bank.
pub const RELAYS_PER_BANK: u8 = 8;

/// Number of selectable relay banks.
pub const BANK_COUNT: u8 = 4;

/// Number of on-board timers.
pub const TIMER_COUNT: u8 = 16;
