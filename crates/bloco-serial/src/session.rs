//! Serial command/response session
//!
//! A [`Session`] owns exactly one open transport and runs one exchange at a
//! time: clear stale input, write the encoded command line, then read lines
//! up to a bounded attempt count, skipping the device's interleaved log
//! noise. Concurrent callers serialize on the exchange lock; a second worker
//! simply blocks until the first exchange finishes.
//!
//! The failure contract is deliberately quiet: a send while disconnected, a
//! device that never answers, or an I/O error mid-exchange all yield `None`.
//! Only `connect` can fail with an error.

use crate::error::Result;
use crate::transport::{SerialTransport, Transport};
use bloco_proto::{codec, Command, Response, ResponseMode};
use std::sync::Mutex;
use std::time::Duration;

/// Default baud rate of every Bloco device
pub const DEFAULT_BAUD: u32 = 115_200;

/// Line-read attempts for a single-response exchange
pub const SINGLE_READ_ATTEMPTS: usize = 10;

/// Line-read attempts for a multi-response exchange (scans)
pub const MULTI_READ_ATTEMPTS: usize = 50;

/// How long to let the device's boot log flush after opening the port
const BOOT_FLUSH_DELAY: Duration = Duration::from_millis(300);

/// What an in-flight exchange is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// READ_BLOCK / VERIFY_BLOCK
    Reading,
    /// WRITE_BLOCK / BATCH_PROGRAM
    Writing,
    /// ERASE_BLOCK
    Erasing,
    /// SCAN_CHANNELS
    Scanning,
    /// SEND_TO_ROBOT / SEND_BLOCKS
    Sending,
    /// GET_STATUS
    Querying,
}

impl Operation {
    fn for_command(cmd: &Command) -> Self {
        match cmd {
            Command::ReadBlock(_) | Command::VerifyBlock(_) => Operation::Reading,
            Command::WriteBlock(_) | Command::BatchProgram(_) => Operation::Writing,
            Command::EraseBlock(_) => Operation::Erasing,
            Command::ScanChannels => Operation::Scanning,
            Command::SendToRobot | Command::SendBlocks(_) => Operation::Sending,
            Command::GetStatus => Operation::Querying,
        }
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No transport held
    Disconnected,
    /// Port open in progress
    Connecting,
    /// Transport held, link idle
    Connected,
    /// Transport held, an exchange is in flight
    Busy(Operation),
}

/// A serial session: one transport, one exchange at a time.
///
/// The session is an owned object; inject it into whatever needs the device
/// rather than reaching for process-wide state.
pub struct Session {
    io: Mutex<Option<Box<dyn Transport>>>,
    // Tracked separately from `io` so state() never blocks behind an
    // in-flight exchange. Lock order is io, then state.
    state: Mutex<State>,
}

impl Session {
    /// Create a disconnected session
    pub fn new() -> Self {
        Self {
            io: Mutex::new(None),
            state: Mutex::new(State::Disconnected),
        }
    }

    fn set_state(&self, state: State) {
        *lock(&self.state) = state;
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        *lock(&self.state)
    }

    /// Whether a transport is currently held
    pub fn is_connected(&self) -> bool {
        matches!(self.state(), State::Connected | State::Busy(_))
    }

    /// Open a serial port and attach it to this session.
    ///
    /// Waits briefly for the device's boot log to flush, then discards any
    /// buffered input so the first exchange starts clean. Replaces a
    /// previously attached transport.
    pub fn connect(&self, device: &str, baud: u32) -> Result<()> {
        self.set_state(State::Connecting);
        let transport = match SerialTransport::open(device, baud) {
            Ok(t) => t,
            Err(e) => {
                self.set_state(State::Disconnected);
                return Err(e);
            }
        };
        std::thread::sleep(BOOT_FLUSH_DELAY);
        self.attach(Box::new(transport))
    }

    /// Attach an already open transport (a simulator, a test double).
    ///
    /// Skips the boot-flush delay; the input buffer is still cleared.
    pub fn attach(&self, mut transport: Box<dyn Transport>) -> Result<()> {
        if let Err(e) = transport.clear_input() {
            self.set_state(State::Disconnected);
            return Err(e);
        }
        *lock(&self.io) = Some(transport);
        self.set_state(State::Connected);
        Ok(())
    }

    /// Drop the transport if one is held; idempotent.
    ///
    /// Invalidate any channel cache built from this session afterwards.
    pub fn disconnect(&self) {
        let mut io = lock(&self.io);
        if io.take().is_some() {
            log::info!("Serial session disconnected");
        }
        self.set_state(State::Disconnected);
    }

    /// Run a single-response exchange.
    ///
    /// `None` means: not connected, no valid response within the attempt
    /// bound, or an I/O failure mid-exchange (logged). Never panics, never
    /// errors.
    pub fn exchange(&self, cmd: &Command) -> Option<Response> {
        self.run(cmd, SINGLE_READ_ATTEMPTS, ResponseMode::Single)
            .and_then(|mut responses| responses.pop())
    }

    /// Run a multi-response exchange, accumulating responses until a
    /// terminal kind arrives or the attempt bound is exhausted.
    ///
    /// Returns the full ordered sequence; `None` only if not a single valid
    /// response arrived.
    pub fn exchange_multi(&self, cmd: &Command) -> Option<Vec<Response>> {
        self.run(cmd, MULTI_READ_ATTEMPTS, ResponseMode::Multi)
    }

    fn run(&self, cmd: &Command, attempts: usize, mode: ResponseMode) -> Option<Vec<Response>> {
        let mut io = lock(&self.io);
        let transport = match io.as_mut() {
            Some(t) => t,
            None => {
                log::debug!("{} while disconnected, dropping", cmd.kind());
                return None;
            }
        };

        self.set_state(State::Busy(Operation::for_command(cmd)));
        let result = Self::do_exchange(transport.as_mut(), cmd, attempts, mode);
        self.set_state(State::Connected);

        match result {
            Ok(responses) if responses.is_empty() => {
                log::warn!("No response for {}", cmd.kind());
                None
            }
            Ok(responses) => Some(responses),
            Err(e) => {
                log::error!("Exchange failed for {}: {}", cmd.kind(), e);
                None
            }
        }
    }

    fn do_exchange(
        transport: &mut dyn Transport,
        cmd: &Command,
        attempts: usize,
        mode: ResponseMode,
    ) -> Result<Vec<Response>> {
        transport.clear_input()?;
        transport.write_all(codec::encode_line(cmd).as_bytes())?;
        transport.flush()?;

        let mut responses = Vec::new();
        for _ in 0..attempts {
            let line = match transport.read_line()? {
                Some(line) => line,
                None => continue, // timed out, attempt consumed
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            log::trace!("rx: {}", line);
            if !codec::is_protocol_line(line) {
                log::debug!("skipping log line: {}", line);
                continue;
            }
            let response = match codec::decode_response(line) {
                Ok(r) => r,
                Err(e) => {
                    log::debug!("skipping undecodable line ({}): {}", e, line);
                    continue;
                }
            };
            match mode {
                ResponseMode::Single => {
                    responses.push(response);
                    break;
                }
                ResponseMode::Multi => {
                    let terminal = response.is_terminal();
                    responses.push(response);
                    if terminal {
                        break;
                    }
                }
            }
        }
        Ok(responses)
    }
}

// A worker that panicked mid-exchange poisons the mutex; the session is
// still usable, so recover the guard instead of propagating the panic.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_on_disconnected_session_yields_none() {
        let session = Session::new();
        assert_eq!(session.state(), State::Disconnected);
        assert!(session.exchange(&Command::read_block(0)).is_none());
        assert!(session.exchange_multi(&Command::ScanChannels).is_none());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let session = Session::new();
        session.disconnect();
        session.disconnect();
        assert_eq!(session.state(), State::Disconnected);
    }

    #[test]
    fn operation_mapping() {
        assert_eq!(
            Operation::for_command(&Command::ScanChannels),
            Operation::Scanning
        );
        assert_eq!(
            Operation::for_command(&Command::erase_block(1)),
            Operation::Erasing
        );
    }
}
