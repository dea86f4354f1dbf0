//! 32-byte EEPROM block image
//!
//! Layout (matches the on-chip record the programmer writes):
//!
//! | offset | field    | size |
//! |--------|----------|------|
//! | 0x00   | type     | 1    |
//! | 0x01   | subtype  | 1    |
//! | 0x02   | param1   | 1    |
//! | 0x03   | param2   | 1    |
//! | 0x04   | serial   | 4    |
//! | 0x08   | version  | 1    |
//! | 0x09   | checksum | 1    |
//! | 0x0A   | reserved | 6    |
//! | 0x10   | name     | 16   |
//!
//! The checksum is the XOR of bytes 0x00 through 0x08. A blank EEPROM reads
//! back as all 0xFF.

use crate::error::{Error, Result};
use crate::types::BLANK_ID;

/// Total size of one block record
pub const BLOCK_DATA_SIZE: usize = 32;

/// Maximum name label length (the 16-byte field keeps a trailing NUL)
pub const NAME_MAX_LEN: usize = 15;

/// Current record format version
pub const BLOCK_VERSION: u8 = 0x01;

const NAME_FIELD_LEN: usize = 16;

/// One decoded block record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockImage {
    /// Block type id
    pub type_id: u8,
    /// Subtype discriminator (0 unless the block has variants)
    pub subtype: u8,
    /// First parameter byte
    pub param1: u8,
    /// Second parameter byte
    pub param2: u8,
    /// Per-block serial number
    pub serial: [u8; 4],
    /// Record format version
    pub version: u8,
    /// Stored checksum (may disagree with the computed one)
    pub checksum: u8,
    /// Name label, NUL padding stripped
    pub name: String,
}

impl BlockImage {
    /// Build a fresh record with a computed checksum.
    ///
    /// Fails if the name does not fit the EEPROM name field.
    pub fn new(
        type_id: u8,
        subtype: u8,
        param1: u8,
        param2: u8,
        serial: [u8; 4],
        name: &str,
    ) -> Result<Self> {
        if name.len() > NAME_MAX_LEN {
            return Err(Error::NameTooLong(name.to_string(), name.len()));
        }
        let mut img = Self {
            type_id,
            subtype,
            param1,
            param2,
            serial,
            version: BLOCK_VERSION,
            checksum: 0,
            name: name.to_string(),
        };
        img.checksum = img.compute_checksum();
        Ok(img)
    }

    /// Decode a raw EEPROM record
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < BLOCK_DATA_SIZE {
            return Err(Error::TruncatedImage(raw.len()));
        }
        let name_bytes = &raw[0x10..0x10 + NAME_FIELD_LEN];
        let name_end = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_FIELD_LEN);
        let name = String::from_utf8_lossy(&name_bytes[..name_end])
            .trim_end_matches('\u{FFFD}')
            .to_string();
        Ok(Self {
            type_id: raw[0x00],
            subtype: raw[0x01],
            param1: raw[0x02],
            param2: raw[0x03],
            serial: [raw[0x04], raw[0x05], raw[0x06], raw[0x07]],
            version: raw[0x08],
            checksum: raw[0x09],
            name,
        })
    }

    /// Encode to the raw 32-byte record
    pub fn to_bytes(&self) -> [u8; BLOCK_DATA_SIZE] {
        let mut raw = [0u8; BLOCK_DATA_SIZE];
        raw[0x00] = self.type_id;
        raw[0x01] = self.subtype;
        raw[0x02] = self.param1;
        raw[0x03] = self.param2;
        raw[0x04..0x08].copy_from_slice(&self.serial);
        raw[0x08] = self.version;
        raw[0x09] = self.checksum;
        let name_bytes = self.name.as_bytes();
        let n = name_bytes.len().min(NAME_MAX_LEN);
        raw[0x10..0x10 + n].copy_from_slice(&name_bytes[..n]);
        raw
    }

    /// XOR of bytes 0x00..=0x08 of the encoded record
    pub fn compute_checksum(&self) -> u8 {
        let mut cksum = self.type_id ^ self.subtype ^ self.param1 ^ self.param2;
        for b in self.serial {
            cksum ^= b;
        }
        cksum ^ self.version
    }

    /// Whether the stored checksum matches the computed one
    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Whether this record reads as a blank (erased) EEPROM
    pub fn is_blank(&self) -> bool {
        self.type_id == BLANK_ID
    }

    /// Serial number as the 8-digit hex string used on the wire
    pub fn serial_hex(&self) -> String {
        format!(
            "{:02X}{:02X}{:02X}{:02X}",
            self.serial[0], self.serial[1], self.serial[2], self.serial[3]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let img = BlockImage::new(0x10, 2, 3, 4, [0xAB, 0x12, 0x00, 0x01], "Go").unwrap();
        let raw = img.to_bytes();
        let back = BlockImage::from_bytes(&raw).unwrap();
        assert_eq!(back, img);
        assert!(back.checksum_ok());
        assert_eq!(back.serial_hex(), "AB120001");
    }

    #[test]
    fn checksum_is_xor_of_header_bytes() {
        let img = BlockImage::new(0x01, 0, 0, 0, [0, 0, 0, 0], "").unwrap();
        // type ^ version only, everything else zero
        assert_eq!(img.checksum, 0x01 ^ BLOCK_VERSION);
        let mut tampered = img.to_bytes();
        tampered[0x02] = 7; // param1 changed, stored checksum now wrong
        assert!(!BlockImage::from_bytes(&tampered).unwrap().checksum_ok());
    }

    #[test]
    fn blank_eeprom_decodes_as_blank() {
        let raw = [0xFF; BLOCK_DATA_SIZE];
        let img = BlockImage::from_bytes(&raw).unwrap();
        assert!(img.is_blank());
        assert_eq!(img.type_id, BLANK_ID);
    }

    #[test]
    fn name_is_nul_terminated_in_field() {
        let img = BlockImage::new(0x20, 0, 0, 0, [1, 2, 3, 4], "Loop Forever 15").unwrap();
        let raw = img.to_bytes();
        // 15-char name leaves the final byte of the field as NUL
        assert_eq!(raw[0x1F], 0);
        assert_eq!(BlockImage::from_bytes(&raw).unwrap().name, "Loop Forever 15");
    }

    #[test]
    fn rejects_oversized_name_and_short_image() {
        assert!(matches!(
            BlockImage::new(0x10, 0, 0, 0, [0; 4], "sixteen chars!!!"),
            Err(Error::NameTooLong(_, 16))
        ));
        assert!(matches!(
            BlockImage::from_bytes(&[0u8; 16]),
            Err(Error::TruncatedImage(16))
        ));
    }
}
