//! bloco-core - Block data model for the Bloco host tools
//!
//! This crate holds the pieces of the Bloco system that are independent of
//! any transport: the block type table (the firmware contract), the 32-byte
//! EEPROM block image, the logical block descriptor, and the per-channel
//! state cache the front-ends render from.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod image;
pub mod types;

pub use cache::{ChannelCache, NUM_CHANNELS};
pub use descriptor::BlockDescriptor;
pub use error::{Error, Result};
pub use image::{BlockImage, BLOCK_DATA_SIZE, BLOCK_VERSION, NAME_MAX_LEN};
pub use types::{BlockType, Category, BLANK_ID};
