//! Byte transports for relay-board connections.
//!
//! The relay client only needs two primitives: transmit a frame and read up
//! to a known number of bytes before a deadline. The framing and validation
//! logic is identical over TCP and serial; the transports differ only in how
//! bytes are moved.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use serialport::SerialPort;

use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};
use crate::error::Result;

/// Narrow byte-stream interface the relay client drives.
///
/// One command is in flight at a time per connection; the wire protocol has
/// no request identifiers, so callers sharing a transport across threads
/// must serialize access themselves.
pub trait Transport {
    /// Transmit every byte of `frame`.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Read up to `max_len` bytes, returning whatever arrived before the
    /// deadline. A short or empty result is not an error at this layer; the
    /// caller decides whether the byte count suffices.
    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>>;
}

fn read_until_deadline<R: Read>(
    reader: &mut R,
    max_len: usize,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut buffer = vec![0u8; max_len];
    let mut filled = 0;
    while filled < max_len {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
        if Instant::now() >= deadline {
            break;
        }
    }
    buffer.truncate(filled);
    Ok(buffer)
}

/// Relay-board connection over a network socket.
pub struct TcpTransport {
    stream: TcpStream,
    timeout: Duration,
}

impl TcpTransport {
    /// Connect with the factory-default response timeout.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Self::connect_with_timeout(addr, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Connect with an explicit response timeout.
    pub fn connect_with_timeout<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport { stream, timeout })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame)?;
        Ok(())
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        read_until_deadline(&mut self.stream, max_len, self.timeout)
    }
}

/// Relay-board connection over a serial line.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialTransport {
    /// Open a port at the default baud rate and response timeout.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(
            path,
            DEFAULT_BAUD_RATE,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    /// Open a port with explicit baud rate and response timeout.
    pub fn open_with(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate).timeout(timeout).open()?;
        Ok(SerialTransport { port, timeout })
    }

    /// List available serial ports.
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        // drop stale bytes left over from an earlier exchange
        self.port.clear(serialport::ClearBuffer::Input)?;
        self.port.write_all(frame)?;
        Ok(())
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        read_until_deadline(&mut self.port, max_len, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stops_at_end_of_stream() {
        let mut source: &[u8] = &[1, 2, 3];
        let bytes = read_until_deadline(&mut source, 8, Duration::from_millis(50)).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn read_stops_at_max_len() {
        let mut source: &[u8] = &[1, 2, 3, 4, 5];
        let bytes = read_until_deadline(&mut source, 4, Duration::from_millis(50)).unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_length_read_returns_immediately() {
        let mut source: &[u8] = &[1, 2, 3];
        let bytes = read_until_deadline(&mut source, 0, Duration::from_millis(50)).unwrap();
        assert!(bytes.is_empty());
    }
}
