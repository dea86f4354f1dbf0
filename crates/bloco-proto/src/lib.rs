//! bloco-proto - JSON-over-serial wire protocol for the Bloco devices
//!
//! The devices speak newline-delimited JSON: one object per command, one or
//! more objects per response, interleaved with free-form boot/log noise that
//! hosts filter out by the leading-`{` heuristic.
//!
//! The `cmd` / `response` tags and every field name in this crate are the
//! firmware compatibility surface. They are shared with the block programmer,
//! the reader board, and the robot, and must not be renamed.
//!
//! Commands and responses are closed tagged-variant types: an unknown tag or
//! an unknown field fails decoding at the boundary instead of being silently
//! ignored.

pub mod codec;
pub mod command;
pub mod response;

pub use codec::{decode_response, encode_line, is_protocol_line, DecodeError};
pub use command::{
    BatchSpec, ChannelRef, Command, ResponseMode, SendBlockSpec, SendSpec, WriteSpec,
};
pub use response::{
    BlockData, DeviceError, Empty, ReadData, Response, ScanStart, SendOk, Status, VerifyOk,
    WriteOk,
};
