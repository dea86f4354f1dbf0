//! Host-to-device commands

use serde::{Deserialize, Serialize};

/// How many responses an exchange for this command should expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Exactly one response object
    Single,
    /// A sequence of response objects ending with a terminal kind
    Multi,
}

/// Channel argument shared by the single-slot programmer commands.
///
/// The firmware falls back to channel 0 when the field is missing, so it is
/// optional on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelRef {
    /// Target channel (0-7)
    #[serde(default)]
    pub channel: u8,
}

/// One block write: the WRITE_BLOCK payload and the BATCH_PROGRAM item shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteSpec {
    /// Target channel (0-7)
    #[serde(default)]
    pub channel: u8,
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
    /// Name label (≤15 chars)
    #[serde(default)]
    pub name: String,
}

/// BATCH_PROGRAM payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSpec {
    /// Blocks to program, in order
    pub blocks: Vec<WriteSpec>,
}

/// One block of a SEND_BLOCKS program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendBlockSpec {
    /// Block type id
    #[serde(rename = "type")]
    pub type_id: u8,
    /// Name label
    #[serde(default)]
    pub name: String,
}

/// SEND_BLOCKS payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendSpec {
    /// Program to broadcast, in execution order
    pub blocks: Vec<SendBlockSpec>,
}

/// A command understood by one of the Bloco devices.
///
/// READ/WRITE/ERASE/VERIFY/BATCH target the block programmer; SCAN, SEND and
/// STATUS target the reader board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Read one channel's EEPROM record
    #[serde(rename = "READ_BLOCK")]
    ReadBlock(ChannelRef),
    /// Program one channel's EEPROM record
    #[serde(rename = "WRITE_BLOCK")]
    WriteBlock(WriteSpec),
    /// Erase one channel back to blank (all 0xFF)
    #[serde(rename = "ERASE_BLOCK")]
    EraseBlock(ChannelRef),
    /// Re-read one channel and check checksum and type validity
    #[serde(rename = "VERIFY_BLOCK")]
    VerifyBlock(ChannelRef),
    /// Program a sequence of blocks, one response per block
    #[serde(rename = "BATCH_PROGRAM")]
    BatchProgram(BatchSpec),
    /// Scan all multiplexer channels for present blocks
    #[serde(rename = "SCAN_CHANNELS")]
    ScanChannels,
    /// Broadcast the currently inserted program to the robot
    #[serde(rename = "SEND_TO_ROBOT")]
    SendToRobot,
    /// Broadcast an explicit program to the robot
    #[serde(rename = "SEND_BLOCKS")]
    SendBlocks(SendSpec),
    /// Query channel count and presence summary
    #[serde(rename = "GET_STATUS")]
    GetStatus,
}

impl Command {
    /// READ_BLOCK for a channel
    pub fn read_block(channel: u8) -> Self {
        Command::ReadBlock(ChannelRef { channel })
    }

    /// ERASE_BLOCK for a channel
    pub fn erase_block(channel: u8) -> Self {
        Command::EraseBlock(ChannelRef { channel })
    }

    /// VERIFY_BLOCK for a channel
    pub fn verify_block(channel: u8) -> Self {
        Command::VerifyBlock(ChannelRef { channel })
    }

    /// The wire tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Command::ReadBlock(_) => "READ_BLOCK",
            Command::WriteBlock(_) => "WRITE_BLOCK",
            Command::EraseBlock(_) => "ERASE_BLOCK",
            Command::VerifyBlock(_) => "VERIFY_BLOCK",
            Command::BatchProgram(_) => "BATCH_PROGRAM",
            Command::ScanChannels => "SCAN_CHANNELS",
            Command::SendToRobot => "SEND_TO_ROBOT",
            Command::SendBlocks(_) => "SEND_BLOCKS",
            Command::GetStatus => "GET_STATUS",
        }
    }

    /// Expected response shape.
    ///
    /// BATCH_PROGRAM is multi-response (one object per block) but has no
    /// terminal kind; its exchange ends only at the attempt bound.
    pub fn response_mode(&self) -> ResponseMode {
        match self {
            Command::ReadBlock(_)
            | Command::WriteBlock(_)
            | Command::EraseBlock(_)
            | Command::VerifyBlock(_) => ResponseMode::Single,
            Command::BatchProgram(_)
            | Command::ScanChannels
            | Command::SendToRobot
            | Command::SendBlocks(_)
            | Command::GetStatus => ResponseMode::Multi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_firmware_shapes() {
        let json = serde_json::to_string(&Command::read_block(3)).unwrap();
        assert_eq!(json, r#"{"cmd":"READ_BLOCK","channel":3}"#);

        let json = serde_json::to_string(&Command::ScanChannels).unwrap();
        assert_eq!(json, r#"{"cmd":"SCAN_CHANNELS"}"#);
    }

    #[test]
    fn decodes_write_with_defaults() {
        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"WRITE_BLOCK","channel":2,"type":16,"name":"Go"}"#)
                .unwrap();
        match cmd {
            Command::WriteBlock(spec) => {
                assert_eq!(spec.channel, 2);
                assert_eq!(spec.type_id, 0x10);
                assert_eq!(spec.subtype, 0);
                assert_eq!(spec.name, "Go");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn missing_channel_defaults_to_zero() {
        let cmd: Command = serde_json::from_str(r#"{"cmd":"ERASE_BLOCK"}"#).unwrap();
        assert_eq!(cmd, Command::erase_block(0));
    }

    #[test]
    fn unknown_tag_and_unknown_field_are_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"cmd":"FORMAT_ALL"}"#).is_err());
        assert!(
            serde_json::from_str::<Command>(r#"{"cmd":"READ_BLOCK","channel":1,"speed":9}"#)
                .is_err()
        );
    }

    #[test]
    fn batch_round_trip() {
        let cmd = Command::BatchProgram(BatchSpec {
            blocks: vec![
                WriteSpec {
                    channel: 0,
                    type_id: 0x01,
                    subtype: 0,
                    param1: 0,
                    param2: 0,
                    name: "Begin".into(),
                },
                WriteSpec {
                    channel: 0,
                    type_id: 0x02,
                    subtype: 0,
                    param1: 0,
                    param2: 0,
                    name: "End".into(),
                },
            ],
        });
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
