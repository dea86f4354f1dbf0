//! Newline-delimited JSON framing
//!
//! One command per line out, one response per line in. The devices also
//! print free-form boot and log text on the same link; anything that does
//! not start with `{` is noise, not protocol.

use crate::command::Command;
use crate::response::Response;
use thiserror::Error;

/// A line failed to decode as a known response
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid JSON, or not a known response shape
    #[error("bad response line: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether a received line is a protocol object rather than log noise
pub fn is_protocol_line(line: &str) -> bool {
    line.trim_start().starts_with('{')
}

/// Encode a command as one newline-terminated wire line
pub fn encode_line(cmd: &Command) -> String {
    // Command serialization cannot fail: every payload is a plain struct.
    let mut line = serde_json::to_string(cmd).expect("command serialization");
    line.push('\n');
    line
}

/// Decode one received line into a response
pub fn decode_response(line: &str) -> Result<Response, DecodeError> {
    Ok(serde_json::from_str(line.trim())?)
}
