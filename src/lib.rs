//! # Bench Protocol Library
//!
//! A Rust library for driving laboratory bench equipment: SCPI instruments
//! (oscilloscope screenshots, waveform capture, quantized setting writes)
//! and ProXR relay boards over TCP or serial links.
//!
//! ## Features
//!
//! - Quantize requested analog settings onto the discrete values hardware
//!   registers accept
//! - Decode SCPI definite-length arbitrary blocks (screenshots, samples)
//! - Transform raw waveform samples into physical `(time, value)` series
//! - Encode, transmit, and validate checksummed relay-board frames
//!
//! ## Example
//!
//! ```no_run
//! use bench_protocol::{RelayBoard, TcpTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = TcpTransport::connect("192.168.1.50:2101")?;
//!     let mut board = RelayBoard::new(transport);
//!     board.turn_on_relay(3)?;
//!     let banks = board.get_all_relay_status()?;
//!     println!("bank 1 status: {:#010b}", banks[0]);
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod constants;
pub mod error;
pub mod frame;
pub mod quantize;
pub mod relay;
pub mod scope;
pub mod scpi;
pub mod transport;
pub mod waveform;

pub use error::{BlockError, ProtocolError, ResponseError, Result};
pub use relay::{DeviceFeatures, RelayBoard, TimerState};
pub use scope::{Channel, Oscilloscope};
pub use scpi::ScpiLink;
pub use transport::{SerialTransport, TcpTransport, Transport};
pub use waveform::{WaveformFormat, WaveformMode, WaveformPreamble};
