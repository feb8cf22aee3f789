#![doc = r#"
Contains the [`MidiWriter`] and its associated constructs

# Overview

A writer holds one growable buffer per track and encodes each event as it is
added. Time moves forward per track: adding a rest or a note with `advance`
set makes the next event wait, and note-offs are scheduled for you when a note
is added, then written in the right order as time passes.

```rust
# use midifile::prelude::*;
let mut writer = MidiWriter::new();
writer.add_text(0, TextType::TrackName, "Scale").unwrap();
writer.add_tempo(0, 96).unwrap();
writer.add_simple_time_signature(0, 3, 4).unwrap();
for note in [60, 62, 64] {
    writer.add_note(0, note, NoteLength::Crochet, 90, true).unwrap();
}
// a chord: three notes on the same tick, then a minim of time
for note in [60, 64, 67] {
    writer.add_note(0, note, NoteLength::Minim, 80, false).unwrap();
}
writer.add_rest(0, NoteLength::Minim).unwrap();
assert_eq!(writer.end_position(0).unwrap(), 384 * 5);

let bytes = writer.finish().unwrap();
assert_eq!(&bytes[..4], b"MThd");
```

Nothing reaches storage until [`MidiWriter::finish`] (or `save`/`write_to` with
the `std` feature). Dropping a writer abandons the document.
"#]

mod error;
pub use error::*;

mod buffer;
pub use buffer::*;

mod notes;
pub use notes::*;

mod track;
use track::TrackWriter;

use crate::{
    file::{
        CHUNK_PREFIX_LEN, DEFAULT_PPQN, FormatType, HEADER_CHUNK_LEN, Header, NoteLength,
        TRACK_MAGIC, Timing,
    },
    message::{
        Channel, MessageType, PITCH_WHEEL_CENTRE,
        meta::{KeySignature, MetaType, SmpteOffset, Tempo, TextType, TimeSignature},
    },
    reader::MAX_MIDI_TRACKS,
};
use alloc::vec::Vec;

/// How far [`MidiWriter::flush_track`] writes pending note-offs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTo {
    /// Every note still sounding, moving the track to the last note-off
    End,
    /// Notes ending at or before this absolute tick, moving the track to it
    Position(u32),
}

/// Settings for a writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriterOptions {
    /// Tracks are numbered below this.
    pub max_tracks: usize,
    /// Notes that can sound at once on one track
    pub polyphony: usize,
    /// Ticks per quarter note
    pub ppqn: u16,
    /// File format written to the header
    pub format: FormatType,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_tracks: MAX_MIDI_TRACKS,
            polyphony: MAX_TRACK_POLYPHONY,
            ppqn: DEFAULT_PPQN,
            format: FormatType::Simultaneous,
        }
    }
}

impl WriterOptions {
    /// Set the track limit
    pub const fn with_max_tracks(mut self, max_tracks: usize) -> Self {
        self.max_tracks = max_tracks;
        self
    }

    /// Set the note slots per track
    pub const fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }

    /// Set the resolution
    pub const fn with_ppqn(mut self, ppqn: u16) -> Self {
        self.ppqn = ppqn;
        self
    }

    /// Set the file format
    pub const fn with_format(mut self, format: FormatType) -> Self {
        self.format = format;
        self
    }
}

#[doc = r#"
A Standard MIDI File being built

Tracks are addressed by index and come into being when first used. Only tracks
that hold at least one event are written out, in index order.

Every method that takes a track checks its arguments before touching anything,
so a failed call leaves the document unchanged.
"#]
#[derive(Debug, Clone)]
pub struct MidiWriter {
    options: WriterOptions,
    tracks: Vec<TrackWriter>,
}

impl Default for MidiWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiWriter {
    /// A writer with format 1, 384 ticks per quarter note and 64-note polyphony.
    pub fn new() -> Self {
        Self::with_options(WriterOptions::default())
    }

    /// A writer with non-default settings.
    pub fn with_options(options: WriterOptions) -> Self {
        Self {
            options,
            tracks: Vec::new(),
        }
    }

    /// The settings in effect
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Ticks per quarter note
    pub fn ppqn(&self) -> u16 {
        self.options.ppqn
    }

    /// Change the resolution, returning the previous one.
    ///
    /// Named note lengths added afterwards scale with it.
    pub fn set_ppqn(&mut self, ppqn: u16) -> WriteResult<u16> {
        if ppqn == 0 || ppqn > 0x7FFF {
            return Err(WriterError::InvalidPpqn(ppqn));
        }
        Ok(core::mem::replace(&mut self.options.ppqn, ppqn))
    }

    /// The file format
    pub fn format(&self) -> FormatType {
        self.options.format
    }

    /// Change the file format, returning the previous one.
    pub fn set_format(&mut self, format: FormatType) -> FormatType {
        core::mem::replace(&mut self.options.format, format)
    }

    /// The channel (1-16) a track's messages go to
    pub fn default_channel(&self, track: usize) -> WriteResult<u8> {
        self.check_track(track)?;
        Ok(self
            .tracks
            .get(track)
            .map_or(Channel::from_status(track as u8), |t| t.channel)
            .number())
    }

    /// Send a track's messages to another channel (1-16), returning the previous one.
    pub fn set_default_channel(&mut self, track: usize, channel: u8) -> WriteResult<u8> {
        let channel = Channel::from_number(channel).ok_or(WriterError::InvalidChannel(channel))?;
        let track = self.track_mut(track)?;
        Ok(core::mem::replace(&mut track.channel, channel).number())
    }

    /// The tick the next event of a track will be written at
    pub fn end_position(&self, track: usize) -> WriteResult<u32> {
        self.check_track(track)?;
        Ok(self.tracks.get(track).map_or(0, TrackWriter::end_position))
    }

    /// Notes still sounding on a track
    pub fn sounding_notes(&self, track: usize) -> WriteResult<usize> {
        self.check_track(track)?;
        Ok(self.tracks.get(track).map_or(0, |t| t.notes.sounding()))
    }

    /// Start a note on the track's default channel.
    ///
    /// Its note-off is written once the track's time passes `length`. With
    /// `advance` the track moves on by `length` straight away, otherwise the
    /// next event starts on the same tick (for chords).
    pub fn add_note(
        &mut self,
        track: usize,
        note: u8,
        length: NoteLength,
        velocity: u8,
        advance: bool,
    ) -> WriteResult<()> {
        if note > 0x7F {
            return Err(WriterError::InvalidNote(note));
        }
        let ticks = length.ticks(self.options.ppqn);
        let track = self.track_mut(track)?;
        if advance {
            track.reserve(0, track.notes.sounding() + 2)?;
        }
        track.note_on(note, ticks, velocity)?;
        if advance {
            track.inc_time(ticks)?;
        }
        Ok(())
    }

    /// Let time pass on a track.
    pub fn add_rest(&mut self, track: usize, length: NoteLength) -> WriteResult<()> {
        self.inc_time(track, length.ticks(self.options.ppqn))
    }

    /// Move a track on by `ticks`, writing any note-offs that fall due.
    pub fn inc_time(&mut self, track: usize, ticks: u32) -> WriteResult<()> {
        self.track_mut(track)?.inc_time(ticks)
    }

    /// Write pending note-offs of a track.
    pub fn flush_track(&mut self, track: usize, to: FlushTo) -> WriteResult<()> {
        self.track_mut(track)?.flush(to)
    }

    /// Move whichever track is behind so both are at the same tick.
    pub fn sync_tracks(&mut self, first: usize, second: usize) -> WriteResult<()> {
        let a = self.end_position(first)?;
        let b = self.end_position(second)?;
        if a < b {
            self.inc_time(first, b - a)
        } else if b < a {
            self.inc_time(second, a - b)
        } else {
            Ok(())
        }
    }

    /// Append already encoded event bytes (no delta-time) after waiting `delta` ticks.
    pub fn add_raw(&mut self, track: usize, bytes: &[u8], delta: u32) -> WriteResult<()> {
        let track = self.track_mut(track)?;
        if delta > 0 {
            track.reserve(bytes.len(), track.notes.sounding() + 1)?;
            track.inc_time(delta)?;
        }
        track.write_event(bytes)
    }

    /// Append a channel voice message on the track's default channel.
    ///
    /// Parameters are masked to seven bits; the second is ignored by program
    /// change and channel pressure.
    pub fn add_message(
        &mut self,
        track: usize,
        kind: MessageType,
        param1: u8,
        param2: u8,
    ) -> WriteResult<()> {
        if !kind.is_channel_voice() {
            return Err(WriterError::InvalidMessageType(kind));
        }
        self.track_mut(track)?.write_channel(kind, [param1, param2])
    }

    /// Polyphonic aftertouch on one key
    pub fn add_key_pressure(&mut self, track: usize, note: u8, pressure: u8) -> WriteResult<()> {
        if note > 0x7F {
            return Err(WriterError::InvalidNote(note));
        }
        self.add_message(track, MessageType::KeyPressure, note, pressure)
    }

    /// Set a controller
    pub fn add_control_change(&mut self, track: usize, controller: u8, value: u8) -> WriteResult<()> {
        self.add_message(track, MessageType::ControlChange, controller, value)
    }

    /// Select an instrument
    pub fn add_program_change(&mut self, track: usize, program: u8) -> WriteResult<()> {
        self.add_message(track, MessageType::ProgramChange, program, 0)
    }

    /// Aftertouch for the whole channel
    pub fn add_channel_pressure(&mut self, track: usize, pressure: u8) -> WriteResult<()> {
        self.add_message(track, MessageType::ChannelPressure, pressure, 0)
    }

    /// Bend the pitch. `value` is clamped to `-8192..=8191`, 0 being no bend.
    pub fn add_pitch_wheel(&mut self, track: usize, value: i16) -> WriteResult<()> {
        let wheel = (value.clamp(-8192, 8191) as i32 + PITCH_WHEEL_CENTRE as i32) as u16;
        self.add_message(
            track,
            MessageType::PitchWheel,
            (wheel & 0x7F) as u8,
            (wheel >> 7) as u8 & 0x7F,
        )
    }

    /// Append a text event of the given kind.
    pub fn add_text(
        &mut self,
        track: usize,
        kind: TextType,
        text: impl AsRef<[u8]>,
    ) -> WriteResult<()> {
        self.track_mut(track)?
            .write_meta(kind.into(), text.as_ref())
    }

    /// Append a tempo change in beats per minute.
    pub fn add_tempo(&mut self, track: usize, bpm: u32) -> WriteResult<()> {
        let tempo = Tempo::from_bpm(bpm).ok_or(WriterError::InvalidTempo(bpm))?;
        self.add_tempo_micros(track, tempo)
    }

    /// Append a tempo change given in microseconds per quarter note.
    pub fn add_tempo_micros(&mut self, track: usize, tempo: Tempo) -> WriteResult<()> {
        self.track_mut(track)?
            .write_meta(MetaType::Tempo, &tempo.to_bytes())
    }

    /// Append a time signature with the usual metronome settings.
    pub fn add_simple_time_signature(
        &mut self,
        track: usize,
        numerator: u8,
        denominator: u8,
    ) -> WriteResult<()> {
        let signature = TimeSignature::new(numerator, denominator).ok_or(
            WriterError::InvalidTimeSignature {
                numerator,
                denominator,
            },
        )?;
        self.add_time_signature(track, signature)
    }

    /// Append a time signature.
    pub fn add_time_signature(&mut self, track: usize, signature: TimeSignature) -> WriteResult<()> {
        let denominator = 1u8
            .checked_shl(signature.denominator_power.into())
            .unwrap_or(0);
        if signature.numerator == 0 || denominator == 0 {
            return Err(WriterError::InvalidTimeSignature {
                numerator: signature.numerator,
                denominator,
            });
        }
        self.track_mut(track)?
            .write_meta(MetaType::TimeSignature, &signature.to_bytes())
    }

    /// Append a key signature.
    pub fn add_key_signature(&mut self, track: usize, key: KeySignature) -> WriteResult<()> {
        if !(-7..=7).contains(&key.key) {
            return Err(WriterError::InvalidKeySignature(key.key));
        }
        self.track_mut(track)?
            .write_meta(MetaType::KeySignature, &key.to_bytes())
    }

    /// Append the track's starting time.
    pub fn add_smpte_offset(&mut self, track: usize, offset: SmpteOffset) -> WriteResult<()> {
        offset.validate()?;
        self.track_mut(track)?
            .write_meta(MetaType::SmpteOffset, &offset.to_bytes())
    }

    /// Append the output port of the track.
    pub fn add_midi_port(&mut self, track: usize, port: u8) -> WriteResult<()> {
        self.track_mut(track)?.write_meta(MetaType::MidiPort, &[port])
    }

    /// Append a sequence number, or an empty one meaning the track's index.
    pub fn add_sequence_number(&mut self, track: usize, number: Option<u16>) -> WriteResult<()> {
        let bytes = number.map(u16::to_be_bytes);
        self.track_mut(track)?.write_meta(
            MetaType::SequenceNumber,
            bytes.as_ref().map_or(&[][..], |b| &b[..]),
        )
    }

    /// Append data for a particular sequencer.
    pub fn add_sequencer_specific(&mut self, track: usize, data: &[u8]) -> WriteResult<()> {
        self.track_mut(track)?
            .write_meta(MetaType::SequencerSpecific, data)
    }

    /// Append a system exclusive message. `data` follows the `F0` status and
    /// should end with `F7`.
    pub fn add_sysex(&mut self, track: usize, data: &[u8]) -> WriteResult<()> {
        self.track_mut(track)?
            .write_system(MessageType::SysEx, None, data)
    }

    /// Append an end-of-track event.
    ///
    /// [`MidiWriter::finish`] adds one to every track that does not already end with one.
    pub fn add_end_of_track(&mut self, track: usize) -> WriteResult<()> {
        self.track_mut(track)?.write_meta(MetaType::EndOfTrack, &[])
    }

    /// Close every track and serialize the file.
    ///
    /// Each track that holds events has its note-offs flushed and gets an
    /// end-of-track event before the header and track chunks are assembled.
    pub fn finish(mut self) -> WriteResult<Vec<u8>> {
        let mut body_len = 0usize;
        for track in self.tracks.iter_mut().filter(|t| !t.buffer.is_empty()) {
            track.flush(FlushTo::End)?;
            if !track.is_ended() {
                track.write_meta(MetaType::EndOfTrack, &[])?;
            }
            body_len = body_len.saturating_add(CHUNK_PREFIX_LEN + track.buffer.len());
        }

        let written: Vec<(usize, &TrackWriter)> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.buffer.is_empty())
            .collect();

        let mut format = self.options.format;
        if format == FormatType::SingleMultiChannel && written.len() > 1 {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Format 0 holds one track, writing {} tracks as format 1",
                written.len()
            );
            format = FormatType::Simultaneous;
        }
        let header = Header::new(
            format,
            written.len().min(u16::MAX as usize) as u16,
            Timing::new_ticks_per_quarter_note(self.options.ppqn),
        );

        let mut out = Vec::new();
        out.try_reserve_exact(HEADER_CHUNK_LEN.saturating_add(body_len))?;
        out.extend_from_slice(&header.to_bytes());
        for (index, track) in &written {
            let bytes = track.buffer.as_slice();
            let len = u32::try_from(bytes.len()).map_err(|_| WriterError::ChunkTooLong {
                track: *index,
                len: bytes.len(),
            })?;
            out.extend_from_slice(&TRACK_MAGIC);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(bytes);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Finished MIDI file: format {:?}, {} tracks, {} bytes",
            format,
            written.len(),
            out.len()
        );
        Ok(out)
    }

    /// Close every track and write the file to `writer`.
    #[cfg(feature = "std")]
    pub fn write_to<W: std::io::Write>(self, mut writer: W) -> WriteResult<()> {
        let bytes = self.finish()?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Close every track and write the file to `path`, replacing any existing file.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<std::path::Path>>(self, path: P) -> WriteResult<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn check_track(&self, track: usize) -> WriteResult<()> {
        if track >= self.options.max_tracks || track > u16::MAX as usize {
            return Err(WriterError::InvalidTrack(track));
        }
        Ok(())
    }

    fn track_mut(&mut self, track: usize) -> WriteResult<&mut TrackWriter> {
        self.check_track(track)?;
        while self.tracks.len() <= track {
            let index = self.tracks.len();
            self.tracks
                .push(TrackWriter::new(index, self.options.polyphony));
        }
        Ok(&mut self.tracks[track])
    }
}

#[cfg(test)]
fn events_of(bytes: &[u8]) -> Vec<crate::message::Message> {
    let mut reader = crate::reader::MidiReader::from_bytes(bytes).unwrap();
    let mut out = Vec::new();
    for track in 0..reader.num_tracks() {
        out.extend(reader.messages(track).map(Result::unwrap));
    }
    out
}

#[test]
fn invalid_arguments_change_nothing() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::with_options(WriterOptions::default().with_max_tracks(4));
    writer.add_note(1, 60, NoteLength::Crochet, 100, true).unwrap();
    let before = writer.end_position(1).unwrap();

    assert!(matches!(
        writer.add_note(4, 60, NoteLength::Crochet, 100, true),
        Err(WriterError::InvalidTrack(4))
    ));
    assert!(matches!(
        writer.add_note(1, 128, NoteLength::Crochet, 100, true),
        Err(WriterError::InvalidNote(128))
    ));
    assert!(matches!(
        writer.set_default_channel(1, 17),
        Err(WriterError::InvalidChannel(17))
    ));
    assert!(matches!(
        writer.add_message(1, MessageType::Meta, 0, 0),
        Err(WriterError::InvalidMessageType(MessageType::Meta))
    ));
    assert!(matches!(
        writer.add_tempo(1, 0),
        Err(WriterError::InvalidTempo(0))
    ));
    assert!(matches!(
        writer.add_simple_time_signature(1, 3, 6),
        Err(WriterError::InvalidTimeSignature {
            numerator: 3,
            denominator: 6
        })
    ));
    assert!(matches!(
        writer.add_key_signature(1, KeySignature { key: 9, minor: false }),
        Err(WriterError::InvalidKeySignature(9))
    ));
    assert!(matches!(writer.set_ppqn(0), Err(WriterError::InvalidPpqn(0))));

    assert_eq!(writer.end_position(1).unwrap(), before);
    // note-on, then the note-off written when the track advanced
    assert_eq!(writer.tracks[1].buffer.len(), 9);
    assert_eq!(writer.ppqn(), DEFAULT_PPQN);
}

#[test]
fn default_channels_follow_the_track_index() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    assert_eq!(writer.default_channel(0).unwrap(), 1);
    assert_eq!(writer.default_channel(17).unwrap(), 2);
    assert_eq!(writer.set_default_channel(17, 10).unwrap(), 2);
    assert_eq!(writer.default_channel(17).unwrap(), 10);
}

#[test]
fn pitch_wheel_is_centred_and_clamped() {
    use crate::message::Event;
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.add_pitch_wheel(0, 0).unwrap();
    writer.add_pitch_wheel(0, -8192).unwrap();
    writer.add_pitch_wheel(0, i16::MAX).unwrap();
    let values: Vec<i16> = events_of(&writer.finish().unwrap())
        .iter()
        .filter_map(|m| match m.event() {
            Event::PitchWheel { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(values, alloc::vec![0, -8192, 8191]);
}

#[test]
fn finish_flushes_notes_before_the_end_of_track() {
    use crate::message::{Event, meta::MetaEvent};
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.add_note(0, 60, NoteLength::Minim, 100, false).unwrap();
    writer.add_note(0, 64, NoteLength::Crochet, 100, false).unwrap();
    let events = events_of(&writer.finish().unwrap());

    let summary: Vec<(u32, bool)> = events
        .iter()
        .map(|m| (m.position(), m.event().is_note_off()))
        .collect();
    assert_eq!(
        summary,
        alloc::vec![(0, false), (0, false), (384, true), (768, true), (768, false)]
    );
    assert_eq!(
        events.last().unwrap().event(),
        &Event::Meta(MetaEvent::EndOfTrack)
    );
}

#[test]
fn explicit_end_of_track_is_not_repeated() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.add_program_change(0, 5).unwrap();
    writer.add_end_of_track(0).unwrap();
    let events = events_of(&writer.finish().unwrap());
    assert_eq!(events.len(), 2);
}

#[test]
fn empty_tracks_are_not_written() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.inc_time(0, 100).unwrap();
    writer.add_program_change(2, 1).unwrap();
    let bytes = writer.finish().unwrap();
    let reader = crate::reader::MidiReader::from_bytes(&bytes[..]).unwrap();
    assert_eq!(reader.num_tracks(), 1);
    assert_eq!(reader.header().format(), FormatType::Simultaneous);
}

#[test]
fn format_zero_with_many_tracks_becomes_format_one() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    assert_eq!(
        writer.set_format(FormatType::SingleMultiChannel),
        FormatType::Simultaneous
    );
    writer.add_program_change(0, 1).unwrap();
    writer.add_program_change(1, 1).unwrap();
    let bytes = writer.finish().unwrap();
    assert_eq!(&bytes[8..10], &[0, 1]);

    let mut writer = MidiWriter::new();
    writer.set_format(FormatType::SingleMultiChannel);
    writer.add_program_change(0, 1).unwrap();
    let bytes = writer.finish().unwrap();
    assert_eq!(&bytes[8..10], &[0, 0]);
}

#[test]
fn sync_pads_the_track_behind() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.add_rest(0, NoteLength::Semibreve).unwrap();
    writer.add_rest(1, NoteLength::Crochet).unwrap();
    writer.sync_tracks(0, 1).unwrap();
    assert_eq!(writer.end_position(1).unwrap(), 384 * 4);
    assert_eq!(writer.end_position(0).unwrap(), 384 * 4);
}

#[test]
fn raw_bytes_wait_for_their_delta() {
    use pretty_assertions::assert_eq;
    let mut writer = MidiWriter::new();
    writer.add_note(0, 60, NoteLength::Ticks(10), 100, false).unwrap();
    writer.add_raw(0, &[0xB0, 0x40, 0x7F], 20).unwrap();
    let events = events_of(&writer.finish().unwrap());
    let positions: Vec<u32> = events.iter().map(|m| m.position()).collect();
    // note-on, its note-off at 10, the raw controller at 20, end of track
    assert_eq!(positions, alloc::vec![0, 10, 20, 20]);
}
