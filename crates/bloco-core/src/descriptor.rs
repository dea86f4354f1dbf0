//! Logical block descriptor
//!
//! A descriptor is what the front-ends cache and render: the last-known
//! content of one channel, decoupled from how it arrived (a programmer read,
//! a board scan, or a decoded EEPROM image).

use crate::types::{self, BLANK_ID};

/// Last-known content of one programmed slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Block type id (0xFF = blank)
    pub type_id: u8,
    /// Subtype discriminator
    pub subtype: u8,
    /// First parameter byte
    pub param1: u8,
    /// Second parameter byte
    pub param2: u8,
    /// Serial identifier in hex, when the device reported one
    pub serial: Option<String>,
    /// Name label ("" when unset)
    pub name: String,
    /// Whether the record checksum was valid at read time
    pub checksum_valid: bool,
}

impl BlockDescriptor {
    /// Whether the slot holds a programmed (non-blank) block
    pub fn is_programmed(&self) -> bool {
        self.type_id != BLANK_ID
    }

    /// Display form of the type id
    pub fn type_label(&self) -> String {
        types::describe(self.type_id)
    }

    /// Short status string for table rendering
    pub fn status(&self) -> &'static str {
        if self.type_id == BLANK_ID {
            "blank"
        } else if !self.checksum_valid {
            "checksum mismatch"
        } else if types::is_valid(self.type_id) {
            "programmed"
        } else {
            "unknown type"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(type_id: u8, checksum_valid: bool) -> BlockDescriptor {
        BlockDescriptor {
            type_id,
            subtype: 0,
            param1: 0,
            param2: 0,
            serial: None,
            name: String::new(),
            checksum_valid,
        }
    }

    #[test]
    fn status_reflects_record_health() {
        assert_eq!(descriptor(0x10, true).status(), "programmed");
        assert_eq!(descriptor(0x10, false).status(), "checksum mismatch");
        assert_eq!(descriptor(BLANK_ID, true).status(), "blank");
        assert_eq!(descriptor(0x05, true).status(), "unknown type");
    }

    #[test]
    fn blank_is_not_programmed() {
        assert!(!descriptor(BLANK_ID, true).is_programmed());
        assert!(descriptor(0x01, true).is_programmed());
    }
}
