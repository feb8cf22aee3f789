use super::{
    FlushTo, MESSAGE_BUDGET, NoteTable, TrackBuffer, WriteResult, WriterError,
};
use crate::{
    message::{Channel, MessageType, meta::MetaType},
    vlq,
};

#[doc = r#"
Write state of one track

`position` is the absolute tick of the last event written and `pending` the
ticks waited since. The next event is written with `pending` as its delta-time.
"#]
#[derive(Debug, Clone)]
pub(crate) struct TrackWriter {
    index: usize,
    pub(crate) buffer: TrackBuffer,
    pub(crate) position: u32,
    pub(crate) pending: u32,
    pub(crate) channel: Channel,
    pub(crate) notes: NoteTable,
    ended: bool,
}

impl TrackWriter {
    pub(crate) fn new(index: usize, polyphony: usize) -> Self {
        Self {
            index,
            buffer: TrackBuffer::new(),
            position: 0,
            pending: 0,
            channel: Channel::from_status(index as u8),
            notes: NoteTable::new(polyphony),
            ended: false,
        }
    }

    /// The tick the next event will be written at
    pub(crate) fn end_position(&self) -> u32 {
        self.position.saturating_add(self.pending)
    }

    /// True if the last event written was an end-of-track
    pub(crate) fn is_ended(&self) -> bool {
        self.ended
    }

    /// Append one event at the pending delta-time.
    pub(crate) fn write_event(&mut self, event: &[u8]) -> WriteResult<()> {
        self.buffer.reserve(event.len())?;
        self.buffer.push_delta(self.pending);
        self.buffer.push(event);
        self.commit();
        self.ended = false;
        Ok(())
    }

    /// Append a meta event at the pending delta-time.
    pub(crate) fn write_meta(&mut self, kind: MetaType, payload: &[u8]) -> WriteResult<()> {
        self.write_system(MessageType::Meta, Some(kind.into()), payload)
    }

    /// Append a meta or system exclusive event with a length-prefixed payload.
    pub(crate) fn write_system(
        &mut self,
        status: MessageType,
        meta_kind: Option<u8>,
        payload: &[u8],
    ) -> WriteResult<()> {
        let len = u32::try_from(payload.len()).map_err(|_| WriterError::ChunkTooLong {
            track: self.index,
            len: payload.len(),
        })?;
        self.buffer.reserve(payload.len())?;
        self.buffer.push_delta(self.pending);
        self.buffer.push(&[status.into()]);
        if let Some(kind) = meta_kind {
            self.buffer.push(&[kind]);
        }
        self.buffer.push(vlq::encode(len).as_bytes());
        self.buffer.push(payload);
        self.commit();
        self.ended = meta_kind == Some(MetaType::EndOfTrack.into());
        Ok(())
    }

    /// Append a channel message on the track's channel.
    pub(crate) fn write_channel(&mut self, kind: MessageType, data: [u8; 2]) -> WriteResult<()> {
        let status = u8::from(kind) | u8::from(self.channel);
        let bytes = [status, data[0] & 0x7F, data[1] & 0x7F];
        self.write_event(&bytes[..1 + kind.data_len()])
    }

    /// Find room for `payload` bytes and `messages` short messages in one go.
    pub(crate) fn reserve(&mut self, payload: usize, messages: usize) -> WriteResult<()> {
        self.buffer
            .reserve(payload.saturating_add(messages.saturating_mul(MESSAGE_BUDGET)))
    }

    /// Start a note and remember when it ends.
    ///
    /// Fails without writing anything if every note slot is taken.
    pub(crate) fn note_on(&mut self, note: u8, ticks: u32, velocity: u8) -> WriteResult<()> {
        let slot = self
            .notes
            .free_slot()
            .ok_or(WriterError::PolyphonyExceeded {
                track: self.index,
                polyphony: self.notes.polyphony(),
            })?;
        self.write_channel(MessageType::NoteOn, [note, velocity])?;
        let end = self.position.saturating_add(ticks);
        self.notes.occupy(slot, note, self.channel, end);
        Ok(())
    }

    /// Let `ticks` pass, writing the note-offs that fall due on the way.
    pub(crate) fn inc_time(&mut self, ticks: u32) -> WriteResult<()> {
        let horizon = self.end_position().saturating_add(ticks);
        self.flush(FlushTo::Position(horizon))
    }

    /// Write the note-offs due by the horizon, earliest first.
    ///
    /// The track ends up at the horizon, or where it already was if that is later.
    /// Room for every note-off is found before any is written.
    pub(crate) fn flush(&mut self, to: FlushTo) -> WriteResult<()> {
        let current = self.end_position();
        let horizon = match to {
            FlushTo::End => self.notes.last_end().map_or(current, |end| end.max(current)),
            FlushTo::Position(tick) => tick.max(current),
        };
        let mut due = self.notes.pending();
        due.retain(|&(_, end)| end <= horizon);
        if !due.is_empty() {
            self.buffer
                .reserve(due.len().saturating_mul(MESSAGE_BUDGET))?;
        }

        for (index, end) in due {
            let slot = self.notes.release(index);
            let end = end.max(self.position);
            self.pending = end - self.position;
            self.buffer.push_delta(self.pending);
            self.buffer.push(&[
                u8::from(MessageType::NoteOff) | u8::from(slot.channel),
                slot.note,
                0,
            ]);
            self.commit();
            self.ended = false;
            #[cfg(feature = "tracing")]
            tracing::trace!(
                "Note-off for note {} on channel {} at tick {end}",
                slot.note,
                slot.channel
            );
        }
        self.pending = horizon - self.position;
        Ok(())
    }

    fn commit(&mut self) {
        self.position = self.position.saturating_add(self.pending);
        self.pending = 0;
    }
}

#[cfg(test)]
fn note_offs(bytes: &[u8]) -> alloc::vec::Vec<(u32, u8)> {
    // walks a stream of (delta, 3-byte channel message) pairs
    let mut out = alloc::vec::Vec::new();
    let mut offset = 0;
    let mut tick = 0;
    while offset < bytes.len() {
        let (delta, used) = vlq::decode(&bytes[offset..]).unwrap();
        offset += used;
        tick += delta;
        if bytes[offset] & 0xF0 == 0x80 {
            out.push((tick, bytes[offset + 1]));
        }
        offset += 3;
    }
    out
}

#[test]
fn a_reservation_covers_a_note_and_its_note_offs() {
    let mut track = TrackWriter::new(0, 4);
    for note in [60, 62, 64] {
        track.note_on(note, 10, 100).unwrap();
    }
    // fill the buffer up to just short of its first growth step
    let filler = alloc::vec![0u8; super::GROWTH_INCREMENT - track.buffer.len() - 48];
    track.write_event(&filler).unwrap();
    let capacity = track.buffer.capacity();

    track.reserve(0, track.notes.sounding() + 2).unwrap();
    let reserved = track.buffer.capacity();
    assert!(reserved > capacity);

    track.note_on(65, 10, 100).unwrap();
    track.inc_time(10).unwrap();
    assert_eq!(track.notes.sounding(), 0);
    assert_eq!(track.buffer.capacity(), reserved);
}

#[test]
fn note_offs_come_out_in_end_order() {
    use pretty_assertions::assert_eq;
    let mut track = TrackWriter::new(0, 4);
    track.note_on(60, 300, 100).unwrap();
    track.note_on(62, 100, 100).unwrap();
    track.note_on(64, 200, 100).unwrap();
    track.flush(FlushTo::End).unwrap();

    assert_eq!(
        note_offs(track.buffer.as_slice()),
        alloc::vec![(100, 62), (200, 64), (300, 60)]
    );
    assert_eq!(track.end_position(), 300);
    assert_eq!(track.notes.sounding(), 0);
}

#[test]
fn inc_time_only_flushes_what_is_due() {
    use pretty_assertions::assert_eq;
    let mut track = TrackWriter::new(0, 4);
    track.note_on(60, 96, 100).unwrap();
    track.note_on(64, 384, 100).unwrap();
    track.inc_time(192).unwrap();

    assert_eq!(note_offs(track.buffer.as_slice()), alloc::vec![(96, 60)]);
    assert_eq!(track.position, 96);
    assert_eq!(track.pending, 96);
    assert_eq!(track.end_position(), 192);
    assert_eq!(track.notes.sounding(), 1);
}

#[test]
fn full_table_rejects_the_next_note() {
    use pretty_assertions::assert_eq;
    let mut track = TrackWriter::new(3, 2);
    track.note_on(60, 10, 100).unwrap();
    track.note_on(61, 10, 100).unwrap();
    let written = track.buffer.len();

    let err = track.note_on(62, 10, 100).unwrap_err();
    assert!(matches!(
        err,
        WriterError::PolyphonyExceeded {
            track: 3,
            polyphony: 2
        }
    ));
    assert_eq!(track.buffer.len(), written);
}

#[test]
fn flush_to_a_past_position_keeps_the_time() {
    use pretty_assertions::assert_eq;
    let mut track = TrackWriter::new(0, 4);
    track.inc_time(500).unwrap();
    track.flush(FlushTo::Position(100)).unwrap();
    assert_eq!(track.end_position(), 500);
    assert!(track.buffer.is_empty());
}

#[test]
fn channel_messages_use_the_track_channel() {
    use pretty_assertions::assert_eq;
    let mut track = TrackWriter::new(2, 4);
    track
        .write_channel(MessageType::ProgramChange, [0x85, 0])
        .unwrap();
    track
        .write_channel(MessageType::ControlChange, [7, 100])
        .unwrap();
    assert_eq!(
        track.buffer.as_slice(),
        &[0x00, 0xC2, 0x05, 0x00, 0xB2, 0x07, 0x64]
    );
}
