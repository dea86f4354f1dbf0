//! Per-channel state cache
//!
//! Holds the most recent descriptor per channel so the front-end can render
//! without re-querying the device. All mutation happens on the owning thread;
//! workers hand their results back over a channel, so no lock is needed here.
//!
//! Disconnecting marks every entry stale rather than deleting it: the
//! last-known state stays renderable, flagged as possibly out of date.

use crate::descriptor::BlockDescriptor;
use crate::error::{Error, Result};

/// Number of channels every Bloco device exposes
pub const NUM_CHANNELS: usize = 8;

#[derive(Debug, Default, Clone)]
struct Slot {
    descriptor: Option<BlockDescriptor>,
    stale: bool,
}

/// Channel index to last-known block descriptor
#[derive(Debug, Default, Clone)]
pub struct ChannelCache {
    slots: [Slot; NUM_CHANNELS],
}

impl ChannelCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, channel: u8) -> Result<&Slot> {
        self.slots
            .get(channel as usize)
            .ok_or(Error::InvalidChannel(channel))
    }

    fn slot_mut(&mut self, channel: u8) -> Result<&mut Slot> {
        self.slots
            .get_mut(channel as usize)
            .ok_or(Error::InvalidChannel(channel))
    }

    /// Replace the stored descriptor for a channel
    pub fn update(&mut self, channel: u8, descriptor: BlockDescriptor) -> Result<()> {
        let slot = self.slot_mut(channel)?;
        slot.descriptor = Some(descriptor);
        slot.stale = false;
        Ok(())
    }

    /// Remove the entry for a channel (after an erase)
    pub fn clear(&mut self, channel: u8) -> Result<()> {
        let slot = self.slot_mut(channel)?;
        slot.descriptor = None;
        slot.stale = false;
        Ok(())
    }

    /// Mark every entry stale (after a disconnect). Data is kept.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.stale = true;
        }
    }

    /// Last-known descriptor for a channel, stale or not
    pub fn get(&self, channel: u8) -> Option<&BlockDescriptor> {
        self.slot(channel).ok()?.descriptor.as_ref()
    }

    /// Whether the entry for a channel predates the last disconnect
    pub fn is_stale(&self, channel: u8) -> bool {
        self.slot(channel).map(|s| s.stale).unwrap_or(false)
    }

    /// Number of channels currently holding a programmed block
    pub fn programmed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.descriptor.as_ref().is_some_and(|d| d.is_programmed()))
            .count()
    }

    /// Iterate (channel, descriptor) over populated entries
    pub fn iter(&self) -> impl Iterator<Item = (u8, &BlockDescriptor)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(ch, s)| s.descriptor.as_ref().map(|d| (ch as u8, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(type_id: u8) -> BlockDescriptor {
        BlockDescriptor {
            type_id,
            subtype: 0,
            param1: 0,
            param2: 0,
            serial: None,
            name: String::new(),
            checksum_valid: true,
        }
    }

    #[test]
    fn update_replaces_previous_descriptor() {
        let mut cache = ChannelCache::new();
        cache.update(3, descriptor(0x10)).unwrap();
        cache.update(3, descriptor(0x20)).unwrap();
        assert_eq!(cache.get(3).unwrap().type_id, 0x20);
        assert_eq!(cache.iter().count(), 1);
    }

    #[test]
    fn invalidate_marks_stale_but_keeps_data() {
        let mut cache = ChannelCache::new();
        cache.update(0, descriptor(0x01)).unwrap();
        cache.update(5, descriptor(0x30)).unwrap();
        cache.invalidate_all();
        assert!(cache.is_stale(0));
        assert!(cache.is_stale(5));
        assert_eq!(cache.get(5).unwrap().type_id, 0x30);
        // A fresh read clears the flag for that channel only
        cache.update(5, descriptor(0x31)).unwrap();
        assert!(!cache.is_stale(5));
        assert!(cache.is_stale(0));
    }

    #[test]
    fn clear_removes_the_entry() {
        let mut cache = ChannelCache::new();
        cache.update(2, descriptor(0x10)).unwrap();
        cache.clear(2).unwrap();
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn channel_bounds_are_checked() {
        let mut cache = ChannelCache::new();
        assert_eq!(
            cache.update(8, descriptor(0x10)),
            Err(Error::InvalidChannel(8))
        );
        assert!(cache.get(200).is_none());
    }

    #[test]
    fn programmed_count_skips_blanks() {
        let mut cache = ChannelCache::new();
        cache.update(0, descriptor(0x10)).unwrap();
        cache.update(1, descriptor(0xFF)).unwrap();
        assert_eq!(cache.programmed_count(), 1);
    }
}
