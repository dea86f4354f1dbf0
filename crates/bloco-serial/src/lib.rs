//! bloco-serial - Serial session and exchange discipline
//!
//! The Bloco devices answer one command at a time over a 115200-baud serial
//! link. This crate owns that discipline: a [`Session`] holds exactly one
//! open transport and serializes command/response exchanges behind a lock,
//! tolerating the device log lines interleaved on the same link.
//!
//! Protocol-level failures are a `None` result, never an error: the only
//! error the session surfaces is a failed `connect`. Callers decide what a
//! missing response means.

pub mod error;
pub mod ports;
pub mod session;
pub mod task;
pub mod transport;

pub use error::{Error, Result};
pub use ports::{available_ports, detect_port};
pub use session::{
    Operation, Session, State, DEFAULT_BAUD, MULTI_READ_ATTEMPTS, SINGLE_READ_ATTEMPTS,
};
pub use task::{spawn, Task};
pub use transport::{SerialTransport, Transport, LINE_TIMEOUT};
