//! Block type table
//!
//! The type ids and their grouping are the firmware contract shared with the
//! programmer, the reader board, and the robot; they must not be renamed or
//! renumbered.

use crate::error::{Error, Result};

/// Type id of a blank (erased) EEPROM
pub const BLANK_ID: u8 = 0xFF;

/// Block category, mirroring the color grouping on the physical blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Program delimiters (BEGIN / END)
    Actions,
    /// Drive and body motion
    Movement,
    /// Loops and conditionals
    ControlFlow,
    /// Beeps and songs
    Sound,
    /// Lamp control
    Light,
    /// Blocking waits
    Wait,
    /// Modifiers for the preceding action block
    Parameters,
    /// Hardware sensor modules
    Sensors,
    /// Eye expressions and look direction
    Eyes,
}

impl Category {
    /// All categories, in display order
    pub const ALL: &'static [Category] = &[
        Category::Actions,
        Category::Movement,
        Category::ControlFlow,
        Category::Sound,
        Category::Light,
        Category::Wait,
        Category::Parameters,
        Category::Sensors,
        Category::Eyes,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Actions => "Actions",
            Category::Movement => "Movement",
            Category::ControlFlow => "Control Flow",
            Category::Sound => "Sound",
            Category::Light => "Light",
            Category::Wait => "Wait",
            Category::Parameters => "Parameters",
            Category::Sensors => "Sensors",
            Category::Eyes => "Eyes",
        }
    }

    /// Parse a category from its label (case-insensitive)
    pub fn from_label(s: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s))
    }
}

/// One entry of the block type table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockType {
    /// Type id as stored in EEPROM byte 0
    pub id: u8,
    /// Symbolic name (e.g. "FORWARD")
    pub name: &'static str,
    /// Category grouping
    pub category: Category,
}

impl BlockType {
    const fn new(id: u8, name: &'static str, category: Category) -> Self {
        Self { id, name, category }
    }

    /// Default label for a freshly programmed block: the symbolic name
    /// title-cased with spaces, truncated to fit the EEPROM name field.
    pub fn default_label(&self) -> String {
        let mut label = String::new();
        for word in self.name.split('_') {
            if !label.is_empty() {
                label.push(' ');
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                label.push(first.to_ascii_uppercase());
                for c in chars {
                    label.push(c.to_ascii_lowercase());
                }
            }
        }
        label.truncate(crate::image::NAME_MAX_LEN);
        label
    }
}

/// The full block type table, in id order
pub static BLOCK_TYPES: &[BlockType] = &[
    // Actions
    BlockType::new(0x01, "BEGIN", Category::Actions),
    BlockType::new(0x02, "END", Category::Actions),
    // Movement
    BlockType::new(0x10, "FORWARD", Category::Movement),
    BlockType::new(0x11, "BACKWARD", Category::Movement),
    BlockType::new(0x12, "TURN_RIGHT", Category::Movement),
    BlockType::new(0x13, "TURN_LEFT", Category::Movement),
    BlockType::new(0x14, "SHAKE", Category::Movement),
    BlockType::new(0x15, "SPIN", Category::Movement),
    // Control flow
    BlockType::new(0x20, "REPEAT", Category::ControlFlow),
    BlockType::new(0x21, "END_REPEAT", Category::ControlFlow),
    BlockType::new(0x22, "IF", Category::ControlFlow),
    BlockType::new(0x23, "END_IF", Category::ControlFlow),
    // Sound
    BlockType::new(0x30, "BEEP", Category::Sound),
    BlockType::new(0x31, "SING", Category::Sound),
    BlockType::new(0x32, "PLAY_TRIANGLE", Category::Sound),
    BlockType::new(0x33, "PLAY_CIRCLE", Category::Sound),
    BlockType::new(0x34, "PLAY_SQUARE", Category::Sound),
    // Light
    BlockType::new(0x40, "WHITE_LIGHT_ON", Category::Light),
    BlockType::new(0x41, "RED_LIGHT_ON", Category::Light),
    BlockType::new(0x42, "BLUE_LIGHT_ON", Category::Light),
    // Wait
    BlockType::new(0x50, "WAIT_FOR_CLAP", Category::Wait),
    // Parameters
    BlockType::new(0x60, "PARAM_2", Category::Parameters),
    BlockType::new(0x61, "PARAM_3", Category::Parameters),
    BlockType::new(0x62, "PARAM_4", Category::Parameters),
    BlockType::new(0x63, "PARAM_FOREVER", Category::Parameters),
    BlockType::new(0x64, "PARAM_LIGHT", Category::Parameters),
    BlockType::new(0x65, "PARAM_DARK", Category::Parameters),
    BlockType::new(0x66, "PARAM_NEAR", Category::Parameters),
    BlockType::new(0x67, "PARAM_FAR", Category::Parameters),
    BlockType::new(0x68, "PARAM_UNTIL_LIGHT", Category::Parameters),
    BlockType::new(0x69, "PARAM_UNTIL_DARK", Category::Parameters),
    BlockType::new(0x6A, "PARAM_UNTIL_NEAR", Category::Parameters),
    BlockType::new(0x6B, "PARAM_UNTIL_FAR", Category::Parameters),
    // Sensors
    BlockType::new(0x70, "SENSOR_LIGHT_BULB", Category::Sensors),
    BlockType::new(0x71, "SENSOR_EAR", Category::Sensors),
    BlockType::new(0x72, "SENSOR_EYE", Category::Sensors),
    BlockType::new(0x73, "SENSOR_TELESCOPE", Category::Sensors),
    BlockType::new(0x74, "SENSOR_SOUND_MODULE", Category::Sensors),
    // Eyes
    BlockType::new(0x80, "EYES_NORMAL", Category::Eyes),
    BlockType::new(0x81, "EYES_HAPPY", Category::Eyes),
    BlockType::new(0x82, "EYES_SAD", Category::Eyes),
    BlockType::new(0x83, "EYES_ANGRY", Category::Eyes),
    BlockType::new(0x84, "EYES_SURPRISED", Category::Eyes),
    BlockType::new(0x85, "EYES_SLEEPING", Category::Eyes),
    BlockType::new(0x86, "EYES_EXCITED", Category::Eyes),
    BlockType::new(0x87, "EYES_FOCUSED", Category::Eyes),
    BlockType::new(0x88, "EYES_LOOK_CENTER", Category::Eyes),
    BlockType::new(0x89, "EYES_LOOK_LEFT", Category::Eyes),
    BlockType::new(0x8A, "EYES_LOOK_RIGHT", Category::Eyes),
    BlockType::new(0x8B, "EYES_LOOK_UP", Category::Eyes),
    BlockType::new(0x8C, "EYES_LOOK_DOWN", Category::Eyes),
];

/// Look up a block type by id
pub fn by_id(id: u8) -> Option<&'static BlockType> {
    BLOCK_TYPES.iter().find(|t| t.id == id)
}

/// Look up a block type by symbolic name (case-insensitive)
pub fn by_name(name: &str) -> Option<&'static BlockType> {
    BLOCK_TYPES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Check whether an id names a known block type
pub fn is_valid(id: u8) -> bool {
    by_id(id).is_some()
}

/// Resolve a user-supplied type spec: a symbolic name, a decimal id,
/// or a hex id with an 0x prefix.
pub fn resolve(spec: &str) -> Result<&'static BlockType> {
    if let Some(t) = by_name(spec) {
        return Ok(t);
    }
    let id = if let Some(hex) = spec.strip_prefix("0x").or_else(|| spec.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else {
        spec.parse::<u8>().ok()
    };
    id.and_then(by_id)
        .ok_or_else(|| Error::UnknownBlockType(spec.to_string()))
}

/// Display form of a type id: "FORWARD (0x10)", "[blank] (0xFF)",
/// or "Unknown (0xNN)".
pub fn describe(id: u8) -> String {
    match by_id(id) {
        Some(t) => format!("{} (0x{:02X})", t.name, t.id),
        None if id == BLANK_ID => format!("[blank] (0x{:02X})", id),
        None => format!("Unknown (0x{:02X})", id),
    }
}
