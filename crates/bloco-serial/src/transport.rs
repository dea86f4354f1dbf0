//! Transport layer abstraction
//!
//! A [`Transport`] moves whole lines over some byte link. The real
//! implementation wraps a serial port; the simulator crate provides an
//! in-memory one for tests and hardware-free demos.

use crate::error::Result;
use std::time::Duration;

/// Per-line read timeout. One exchange waits at most this long per read
/// attempt; the attempt bound lives in the session.
pub const LINE_TIMEOUT: Duration = Duration::from_secs(1);

/// Line-oriented byte transport
pub trait Transport: Send {
    /// Write raw bytes
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()>;

    /// Read one line, without its terminator.
    ///
    /// Returns `Ok(None)` when no complete line arrived within the per-line
    /// timeout. Partial input is kept for the next call.
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Discard any pending input, including partial lines
    fn clear_input(&mut self) -> Result<()>;
}

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    /// Bytes received after the last complete line
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open a serial port at the given baud rate (8N1, no flow control)
    pub fn open(device: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(device, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;

        log::info!("Opened serial port {} at {} baud", device, baud);

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }

    fn take_line(&mut self) -> Option<String> {
        next_line(&mut self.pending)
    }
}

/// Pop the first complete line off a receive buffer, stripping CR/LF.
/// Partial trailing input stays in the buffer.
fn next_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=pos).collect();
    let text = String::from_utf8_lossy(&line);
    Some(text.trim_end_matches(['\n', '\r']).to_string())
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        use std::io::Write;
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        use std::io::Read;

        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let deadline = std::time::Instant::now() + LINE_TIMEOUT;
        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
            if std::time::Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        self.pending.clear();
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_splits_on_newline_and_strips_cr() {
        let mut pending = b"hello\r\n{\"a\":1}\npartial".to_vec();
        assert_eq!(next_line(&mut pending).as_deref(), Some("hello"));
        assert_eq!(next_line(&mut pending).as_deref(), Some("{\"a\":1}"));
        assert_eq!(next_line(&mut pending), None);
        assert_eq!(pending, b"partial");
    }

    #[test]
    fn next_line_handles_blank_lines() {
        let mut pending = b"\n\nx\n".to_vec();
        assert_eq!(next_line(&mut pending).as_deref(), Some(""));
        assert_eq!(next_line(&mut pending).as_deref(), Some(""));
        assert_eq!(next_line(&mut pending).as_deref(), Some("x"));
    }
}
