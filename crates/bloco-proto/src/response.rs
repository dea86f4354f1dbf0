//! Device-to-host responses

use bloco_core::{types, BlockDescriptor};
use serde::{Deserialize, Serialize};

/// READ_DATA payload: one channel's EEPROM record as the programmer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadData {
    /// Channel echo (newer firmware only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// Block type id
    #[serde(rename = "type")]
    pub type_id: u8,
    /// Subtype discriminator
    #[serde(default)]
    pub subtype: u8,
    /// First parameter byte
    #[serde(default)]
    pub param1: u8,
    /// Second parameter byte
    #[serde(default)]
    pub param2: u8,
    /// Serial number in hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Name label
    #[serde(default)]
    pub name: String,
}

impl ReadData {
    /// Descriptor for the cache. The programmer's read response carries no
    /// checksum flag; validity follows from the type id being a known one.
    pub fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            type_id: self.type_id,
            subtype: self.subtype,
            param1: self.param1,
            param2: self.param2,
            serial: self.serial.clone(),
            name: self.name.clone(),
            checksum_valid: types::is_valid(self.type_id),
        }
    }
}

/// WRITE_OK payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteOk {
    /// Type id actually written
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u8>,
    /// Serial number assigned to the block
    pub serial: String,
}

/// VERIFY_OK payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyOk {
    /// Checksum and type validity both hold
    #[serde(rename = "match")]
    pub matches: bool,
}

/// BLOCK_DATA payload: one channel of a board scan.
///
/// Only `channel` and `present` are always there; the record fields appear
/// when a block is inserted, and `error` replaces them when the read failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockData {
    /// Multiplexer channel
    pub channel: u8,
    /// Whether a block is inserted in this slot
    pub present: bool,
    /// Block type id
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<u8>,
    /// Subtype discriminator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<u8>,
    /// First parameter byte
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param1: Option<u8>,
    /// Second parameter byte
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param2: Option<u8>,
    /// Serial number in hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Record format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    /// Stored checksum byte
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u8>,
    /// Whether the stored checksum matches the recomputed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_valid: Option<bool>,
    /// Name label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the type id is a known one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    /// Read-failure tag (e.g. "read_failed") when the slot could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockData {
    /// Descriptor for the cache; `None` for empty or unreadable slots
    pub fn descriptor(&self) -> Option<BlockDescriptor> {
        if !self.present || self.error.is_some() {
            return None;
        }
        Some(BlockDescriptor {
            type_id: self.type_id?,
            subtype: self.subtype.unwrap_or(0),
            param1: self.param1.unwrap_or(0),
            param2: self.param2.unwrap_or(0),
            serial: self.serial.clone(),
            name: self.name.clone().unwrap_or_default(),
            checksum_valid: self.checksum_valid.unwrap_or(false),
        })
    }
}

/// SCAN_START payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanStart {
    /// Number of channels the scan will cover
    pub num_channels: u8,
}

/// SEND_OK payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SendOk {
    /// Block count, reported by SEND_BLOCKS only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks_sent: Option<u8>,
}

/// STATUS payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Status {
    /// Number of multiplexer channels
    pub num_channels: u8,
    /// Channels with a block inserted
    pub blocks_present: u8,
    /// I2C bus health
    pub i2c_ok: bool,
}

/// Field-less response payload (ERASE_OK, SCAN_END)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Empty {}

/// ERROR payload.
///
/// The block programmer reports `code` + `message`; the board firmware uses
/// the short `msg` spelling. Both occur on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DeviceError {
    /// Numeric error code (block programmer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    /// Error text (block programmer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error text (board firmware)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Failing item index, in batch responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl DeviceError {
    /// The error text, whichever field carried it
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .unwrap_or("unknown device error")
    }
}

/// A response from one of the Bloco devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response")]
pub enum Response {
    /// Result of READ_BLOCK
    #[serde(rename = "READ_DATA")]
    ReadData(ReadData),
    /// Result of WRITE_BLOCK (and each BATCH_PROGRAM item)
    #[serde(rename = "WRITE_OK")]
    WriteOk(WriteOk),
    /// Result of ERASE_BLOCK
    #[serde(rename = "ERASE_OK")]
    EraseOk(Empty),
    /// Result of VERIFY_BLOCK
    #[serde(rename = "VERIFY_OK")]
    VerifyOk(VerifyOk),
    /// One channel of a SCAN_CHANNELS sweep
    #[serde(rename = "BLOCK_DATA")]
    BlockData(BlockData),
    /// Scan preamble
    #[serde(rename = "SCAN_START")]
    ScanStart(ScanStart),
    /// Scan terminator
    #[serde(rename = "SCAN_END")]
    ScanEnd(Empty),
    /// Result of SEND_TO_ROBOT / SEND_BLOCKS
    #[serde(rename = "SEND_OK")]
    SendOk(SendOk),
    /// Result of GET_STATUS
    #[serde(rename = "STATUS")]
    Status(Status),
    /// Device-reported failure
    #[serde(rename = "ERROR")]
    Error(DeviceError),
}

impl Response {
    /// The wire tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Response::ReadData(_) => "READ_DATA",
            Response::WriteOk(_) => "WRITE_OK",
            Response::EraseOk(_) => "ERASE_OK",
            Response::VerifyOk(_) => "VERIFY_OK",
            Response::BlockData(_) => "BLOCK_DATA",
            Response::ScanStart(_) => "SCAN_START",
            Response::ScanEnd(_) => "SCAN_END",
            Response::SendOk(_) => "SEND_OK",
            Response::Status(_) => "STATUS",
            Response::Error(_) => "ERROR",
        }
    }

    /// Whether this kind ends a multi-response exchange
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Response::ScanEnd(_) | Response::SendOk(_) | Response::Status(_)
        )
    }
}
