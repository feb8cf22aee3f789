use crate::message::Channel;
use alloc::vec::Vec;

/// Notes that can sound at once on one track unless configured otherwise
pub const MAX_TRACK_POLYPHONY: usize = 64;

/// A sounding note waiting for its note-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteSlot {
    /// Key, 0-127
    pub note: u8,
    /// Channel the note-on went to
    pub channel: Channel,
    /// Absolute tick of the note-off
    pub end: u32,
    /// False once the note-off has been written
    pub valid: bool,
}

#[doc = r#"
Fixed-size table of the notes sounding on a track

A note-on takes the first free slot; flushing frees slots in order of their
end ticks.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTable {
    slots: Vec<NoteSlot>,
}

impl NoteTable {
    /// A table with `polyphony` free slots
    pub fn new(polyphony: usize) -> Self {
        Self {
            slots: alloc::vec![NoteSlot::default(); polyphony],
        }
    }

    /// Number of slots
    pub fn polyphony(&self) -> usize {
        self.slots.len()
    }

    /// Number of notes still sounding
    pub fn sounding(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }

    /// Index of the first free slot
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| !s.valid)
    }

    pub(crate) fn occupy(&mut self, index: usize, note: u8, channel: Channel, end: u32) {
        self.slots[index] = NoteSlot {
            note,
            channel,
            end,
            valid: true,
        };
    }

    /// Sounding notes as `(slot, end)`, earliest end first.
    ///
    /// Notes ending on the same tick keep slot order.
    pub fn pending(&self) -> Vec<(usize, u32)> {
        let mut pending: Vec<(usize, u32)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.valid)
            .map(|(i, s)| (i, s.end))
            .collect();
        pending.sort_by_key(|&(_, end)| end);
        pending
    }

    /// The latest end tick of any sounding note
    pub fn last_end(&self) -> Option<u32> {
        self.slots.iter().filter(|s| s.valid).map(|s| s.end).max()
    }

    pub(crate) fn release(&mut self, index: usize) -> NoteSlot {
        let slot = self.slots[index];
        self.slots[index].valid = false;
        slot
    }
}

#[test]
fn slots_fill_and_free_in_order() {
    use pretty_assertions::assert_eq;
    let mut table = NoteTable::new(3);
    assert_eq!(table.free_slot(), Some(0));
    table.occupy(0, 60, Channel::One, 300);
    table.occupy(1, 62, Channel::One, 100);
    table.occupy(2, 64, Channel::Two, 200);
    assert_eq!(table.free_slot(), None);
    assert_eq!(table.pending(), alloc::vec![(1, 100), (2, 200), (0, 300)]);
    assert_eq!(table.last_end(), Some(300));

    let slot = table.release(1);
    assert_eq!(slot.note, 62);
    assert_eq!(table.free_slot(), Some(1));
    assert_eq!(table.sounding(), 2);
}
