//! Error types for the block data model

use thiserror::Error;

/// Errors from block model validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Channel index outside 0-7
    #[error("channel {0} out of range (0-7)")]
    InvalidChannel(u8),

    /// Block type name or id not in the firmware table
    #[error("unknown block type: {0}")]
    UnknownBlockType(String),

    /// Block name label longer than the EEPROM name field allows
    #[error("block name {0:?} too long ({1} bytes, max 15)")]
    NameTooLong(String, usize),

    /// Raw EEPROM image shorter than the 32-byte record
    #[error("block image truncated: got {0} bytes, need 32")]
    TruncatedImage(usize),
}

/// Result type for block model operations
pub type Result<T> = core::result::Result<T, Error>;
