//! Error types for serial sessions

use thiserror::Error;

/// Errors surfaced by session and transport setup.
///
/// Exchange failures are deliberately not here: once connected, a failed
/// exchange yields `None`, not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error (failed open, lost device)
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error while talking to an open transport
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;
