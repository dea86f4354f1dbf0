//! Simulated device firmware
//!
//! Each simulator mirrors one real device's command handler: one JSON line
//! in, zero or more response lines out, with the same quirks: the block
//! programmer answers unknown commands with an ERROR object, the reader
//! board silently ignores them.

use bloco_core::{image, types, BlockImage, BLOCK_DATA_SIZE, NUM_CHANNELS};
use bloco_proto::{
    response::{BlockData, DeviceError, Empty, ReadData, ScanStart, SendOk, Status, VerifyOk, WriteOk},
    Command, Response,
};

/// A device's command handler: one received line in, response lines out
pub trait Firmware: Send {
    /// Handle one line from the host
    fn handle_line(&mut self, line: &str) -> Vec<String>;
}

fn emit(response: &Response) -> String {
    // Response payloads are plain structs; serialization cannot fail.
    serde_json::to_string(response).expect("response serialization")
}

fn clamp_channel(channel: u8) -> usize {
    // The firmware falls back to channel 0 on out-of-range input.
    if (channel as usize) < NUM_CHANNELS {
        channel as usize
    } else {
        0
    }
}

/// Simulated block EEPROM programmer (single programming slot per channel)
pub struct BlockSim {
    eeprom: [[u8; BLOCK_DATA_SIZE]; NUM_CHANNELS],
    next_serial: u32,
}

impl Default for BlockSim {
    fn default() -> Self {
        Self {
            eeprom: [[0xFF; BLOCK_DATA_SIZE]; NUM_CHANNELS],
            next_serial: 1,
        }
    }
}

impl BlockSim {
    /// Fresh programmer with every channel blank
    pub fn new() -> Self {
        Self::default()
    }

    /// Program a channel directly, for test and demo setups
    pub fn preload(&mut self, channel: u8, type_id: u8, name: &str) {
        let spec = bloco_proto::WriteSpec {
            channel,
            type_id,
            subtype: 0,
            param1: 0,
            param2: 0,
            name: name.to_string(),
        };
        self.write_block(&spec);
    }

    fn assign_serial(&mut self) -> [u8; 4] {
        let serial = self.next_serial.to_be_bytes();
        self.next_serial += 1;
        serial
    }

    fn write_block(&mut self, spec: &bloco_proto::WriteSpec) -> WriteOk {
        let ch = clamp_channel(spec.channel);
        let serial = self.assign_serial();
        let mut name = spec.name.clone();
        name.truncate(image::NAME_MAX_LEN);
        // NameTooLong is unreachable after the truncate
        let img = BlockImage::new(
            spec.type_id,
            spec.subtype,
            spec.param1,
            spec.param2,
            serial,
            &name,
        )
        .expect("truncated name fits");
        self.eeprom[ch] = img.to_bytes();
        WriteOk {
            type_id: Some(spec.type_id),
            serial: img.serial_hex(),
        }
    }

    fn read_block(&self, channel: u8) -> ReadData {
        let img = BlockImage::from_bytes(&self.eeprom[clamp_channel(channel)])
            .expect("stored image is full-size");
        ReadData {
            channel: None,
            type_id: img.type_id,
            subtype: img.subtype,
            param1: img.param1,
            param2: img.param2,
            serial: Some(img.serial_hex()),
            name: img.name,
        }
    }
}

impl Firmware for BlockSim {
    fn handle_line(&mut self, line: &str) -> Vec<String> {
        let cmd: Command = match serde_json::from_str(line) {
            Ok(cmd) => cmd,
            Err(_) => {
                return vec![emit(&Response::Error(DeviceError {
                    code: Some(0),
                    message: Some("Invalid JSON".into()),
                    ..Default::default()
                }))]
            }
        };

        match cmd {
            Command::ReadBlock(arg) => {
                vec![emit(&Response::ReadData(self.read_block(arg.channel)))]
            }
            Command::WriteBlock(spec) => {
                let ok = self.write_block(&spec);
                vec![emit(&Response::WriteOk(ok))]
            }
            Command::EraseBlock(arg) => {
                self.eeprom[clamp_channel(arg.channel)] = [0xFF; BLOCK_DATA_SIZE];
                vec![emit(&Response::EraseOk(Empty {}))]
            }
            Command::VerifyBlock(arg) => {
                let img = BlockImage::from_bytes(&self.eeprom[clamp_channel(arg.channel)])
                    .expect("stored image is full-size");
                vec![emit(&Response::VerifyOk(VerifyOk {
                    matches: img.checksum_ok() && types::is_valid(img.type_id),
                }))]
            }
            Command::BatchProgram(batch) => batch
                .blocks
                .iter()
                .map(|spec| emit(&Response::WriteOk(self.write_block(spec))))
                .collect(),
            // Board-only commands: this device does not know them
            Command::ScanChannels
            | Command::SendToRobot
            | Command::SendBlocks(_)
            | Command::GetStatus => {
                vec![emit(&Response::Error(DeviceError {
                    code: Some(0),
                    message: Some("Unknown command".into()),
                    ..Default::default()
                }))]
            }
        }
    }
}

/// Simulated reader board: an I2C multiplexer with 8 block slots
pub struct BoardSim {
    slots: [Option<BlockImage>; NUM_CHANNELS],
}

impl Default for BoardSim {
    fn default() -> Self {
        Self {
            slots: Default::default(),
        }
    }
}

impl BoardSim {
    /// Empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Board with blocks inserted in the given (channel, type, name) slots
    pub fn with_blocks(blocks: &[(u8, u8, &str)]) -> Self {
        let mut board = Self::new();
        for (i, &(channel, type_id, name)) in blocks.iter().enumerate() {
            let serial = (i as u32 + 1).to_be_bytes();
            let mut label = name.to_string();
            label.truncate(image::NAME_MAX_LEN);
            let img =
                BlockImage::new(type_id, 0, 0, 0, serial, &label).expect("truncated name fits");
            board.slots[clamp_channel(channel)] = Some(img);
        }
        board
    }

    fn block_data(&self, channel: usize) -> BlockData {
        match &self.slots[channel] {
            Some(img) => BlockData {
                channel: channel as u8,
                present: true,
                type_id: Some(img.type_id),
                subtype: Some(img.subtype),
                param1: Some(img.param1),
                param2: Some(img.param2),
                serial: Some(img.serial_hex()),
                version: Some(img.version),
                checksum: Some(img.checksum),
                checksum_valid: Some(img.checksum_ok()),
                name: Some(img.name.clone()),
                valid: Some(types::is_valid(img.type_id)),
                error: None,
            },
            None => BlockData {
                channel: channel as u8,
                present: false,
                type_id: None,
                subtype: None,
                param1: None,
                param2: None,
                serial: None,
                version: None,
                checksum: None,
                checksum_valid: None,
                name: None,
                valid: None,
                error: None,
            },
        }
    }

    fn present_count(&self) -> u8 {
        self.slots.iter().filter(|s| s.is_some()).count() as u8
    }
}

impl Firmware for BoardSim {
    fn handle_line(&mut self, line: &str) -> Vec<String> {
        let cmd: Command = match serde_json::from_str(line) {
            Ok(cmd) => cmd,
            Err(_) => {
                // The board only complains about bad JSON on the one command
                // it has to parse structurally; everything else it ignores.
                if line.contains("SEND_BLOCKS") {
                    return vec![emit(&Response::Error(DeviceError {
                        msg: Some("JSON parse failed".into()),
                        ..Default::default()
                    }))];
                }
                return Vec::new();
            }
        };

        match cmd {
            Command::ScanChannels => {
                let mut lines = vec![emit(&Response::ScanStart(ScanStart {
                    num_channels: NUM_CHANNELS as u8,
                }))];
                for ch in 0..NUM_CHANNELS {
                    lines.push(emit(&Response::BlockData(self.block_data(ch))));
                }
                lines.push(emit(&Response::ScanEnd(Empty {})));
                lines
            }
            Command::SendToRobot => {
                vec![emit(&Response::SendOk(SendOk { blocks_sent: None }))]
            }
            Command::SendBlocks(send) => {
                let n = send.blocks.len();
                if n == 0 || n > NUM_CHANNELS {
                    vec![emit(&Response::Error(DeviceError {
                        msg: Some("block count out of range".into()),
                        ..Default::default()
                    }))]
                } else {
                    vec![emit(&Response::SendOk(SendOk {
                        blocks_sent: Some(n as u8),
                    }))]
                }
            }
            Command::GetStatus => {
                vec![emit(&Response::Status(Status {
                    num_channels: NUM_CHANNELS as u8,
                    blocks_present: self.present_count(),
                    i2c_ok: true,
                }))]
            }
            // Programmer commands are not part of the board's handler; the
            // real firmware falls through without answering.
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_write_then_read_round_trips() {
        let mut sim = BlockSim::new();
        let out = sim.handle_line(
            r#"{"cmd":"WRITE_BLOCK","channel":2,"type":16,"subtype":0,"param1":0,"param2":0,"name":"Go"}"#,
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("\"WRITE_OK\""));

        let out = sim.handle_line(r#"{"cmd":"READ_BLOCK","channel":2}"#);
        let resp: Response = serde_json::from_str(&out[0]).unwrap();
        let Response::ReadData(data) = resp else {
            panic!("wrong variant: {out:?}");
        };
        assert_eq!(data.type_id, 0x10);
        assert_eq!(data.name, "Go");
    }

    #[test]
    fn blank_channel_reads_as_blank() {
        let mut sim = BlockSim::new();
        let out = sim.handle_line(r#"{"cmd":"READ_BLOCK","channel":5}"#);
        let Response::ReadData(data) = serde_json::from_str(&out[0]).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(data.type_id, 0xFF);
    }

    #[test]
    fn erase_then_verify_fails_the_match() {
        let mut sim = BlockSim::new();
        sim.preload(1, 0x20, "Loop");
        let out = sim.handle_line(r#"{"cmd":"VERIFY_BLOCK","channel":1}"#);
        assert!(out[0].contains("\"match\":true"));

        sim.handle_line(r#"{"cmd":"ERASE_BLOCK","channel":1}"#);
        let out = sim.handle_line(r#"{"cmd":"VERIFY_BLOCK","channel":1}"#);
        // Blank EEPROM: type 0xFF is not a valid block type
        assert!(out[0].contains("\"match\":false"));
    }

    #[test]
    fn batch_program_answers_per_item() {
        let mut sim = BlockSim::new();
        let out = sim.handle_line(
            r#"{"cmd":"BATCH_PROGRAM","blocks":[{"type":1,"name":"Begin"},{"type":2,"name":"End"}]}"#,
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|l| l.contains("WRITE_OK")));
    }

    #[test]
    fn block_sim_rejects_bad_json_and_unknown_commands() {
        let mut sim = BlockSim::new();
        let out = sim.handle_line("{nope");
        assert!(out[0].contains("Invalid JSON"));
        let out = sim.handle_line(r#"{"cmd":"SCAN_CHANNELS"}"#);
        assert!(out[0].contains("Unknown command"));
    }

    #[test]
    fn board_scan_shape() {
        let mut board = BoardSim::with_blocks(&[(0, 0x01, "Begin"), (3, 0x10, "Go")]);
        let out = board.handle_line(r#"{"cmd":"SCAN_CHANNELS"}"#);
        // SCAN_START + 8 channels + SCAN_END
        assert_eq!(out.len(), 10);
        assert!(out[0].contains("SCAN_START"));
        assert!(out[1].contains("\"present\":true"));
        assert!(out[2].contains("\"present\":false"));
        assert!(out[9].contains("SCAN_END"));
    }

    #[test]
    fn board_send_blocks_bounds() {
        let mut board = BoardSim::new();
        let out = board.handle_line(r#"{"cmd":"SEND_BLOCKS","blocks":[{"type":16,"name":"Go"}]}"#);
        assert!(out[0].contains("\"blocks_sent\":1"));
        let out = board.handle_line(r#"{"cmd":"SEND_BLOCKS","blocks":[]}"#);
        assert!(out[0].contains("block count out of range"));
    }

    #[test]
    fn board_ignores_programmer_commands() {
        let mut board = BoardSim::new();
        assert!(board.handle_line(r#"{"cmd":"READ_BLOCK","channel":0}"#).is_empty());
        assert!(board.handle_line("garbage").is_empty());
    }

    #[test]
    fn board_status_counts_present_blocks() {
        let mut board = BoardSim::with_blocks(&[(1, 0x30, "Beep"), (2, 0x31, "Sing")]);
        let out = board.handle_line(r#"{"cmd":"GET_STATUS"}"#);
        let Response::Status(status) = serde_json::from_str(&out[0]).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(status.blocks_present, 2);
        assert!(status.i2c_ok);
    }
}
