#![doc = r#"
Meta events

A meta event is stored in a track as

```text
FF <type> <length: variable-length quantity> <payload: length bytes>
```

and never reaches a synthesizer. It carries text, tempo, time and key
signatures, and other information about the track.
"#]

mod smpte_offset;
pub use smpte_offset::*;

mod signature;
pub use signature::*;

use super::Channel;
use alloc::vec::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The sub-type byte following `FF`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MetaType {
    /// FF 00 02 ssss
    SequenceNumber = 0x00,
    /// FF 01 len text
    Text = 0x01,
    /// FF 02 len text
    Copyright = 0x02,
    /// FF 03 len text
    TrackName = 0x03,
    /// FF 04 len text
    InstrumentName = 0x04,
    /// FF 05 len text
    Lyric = 0x05,
    /// FF 06 len text
    Marker = 0x06,
    /// FF 07 len text
    CuePoint = 0x07,
    /// FF 20 01 cc
    ChannelPrefix = 0x20,
    /// FF 21 01 pp
    MidiPort = 0x21,
    /// FF 2F 00
    EndOfTrack = 0x2F,
    /// FF 51 03 tttttt
    Tempo = 0x51,
    /// FF 54 05 hr mn se fr ff
    SmpteOffset = 0x54,
    /// FF 58 04 nn dd cc bb
    TimeSignature = 0x58,
    /// FF 59 02 sf mi
    KeySignature = 0x59,
    /// FF 7F len data
    SequencerSpecific = 0x7F,
}

/// The meta types that carry text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TextType {
    /// Any text
    Text = 0x01,
    /// A copyright notice
    Copyright = 0x02,
    /// Sequence or track name
    TrackName = 0x03,
    /// Instrument name
    InstrumentName = 0x04,
    /// A lyric, usually one syllable
    Lyric = 0x05,
    /// Rehearsal letter or section name
    Marker = 0x06,
    /// Description of something happening on screen or stage
    CuePoint = 0x07,
}

impl From<TextType> for MetaType {
    fn from(value: TextType) -> Self {
        match value {
            TextType::Text => Self::Text,
            TextType::Copyright => Self::Copyright,
            TextType::TrackName => Self::TrackName,
            TextType::InstrumentName => Self::InstrumentName,
            TextType::Lyric => Self::Lyric,
            TextType::Marker => Self::Marker,
            TextType::CuePoint => Self::CuePoint,
        }
    }
}

/// Microseconds per quarter note, and the beats per minute derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tempo(u32);

impl Default for Tempo {
    /// 120 BPM
    fn default() -> Self {
        Self(500_000)
    }
}

impl Tempo {
    /// Largest value the 24-bit field holds
    pub const MAX_MICROS: u32 = 0x00FF_FFFF;

    /// Create from microseconds per quarter note, truncated to 24 bits.
    pub const fn new(micros_per_quarter_note: u32) -> Self {
        Self(micros_per_quarter_note & Self::MAX_MICROS)
    }

    /// Create from beats per minute. `None` for zero.
    ///
    /// Below 4 BPM the microsecond count no longer fits in 24 bits and is capped.
    pub const fn from_bpm(bpm: u32) -> Option<Self> {
        if bpm == 0 {
            return None;
        }
        let micros = 60_000_000 / bpm;
        Some(Self(if micros > Self::MAX_MICROS {
            Self::MAX_MICROS
        } else {
            micros
        }))
    }

    /// Read the 3-byte big-endian payload.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    /// The 3-byte payload.
    pub const fn to_bytes(&self) -> [u8; 3] {
        let [_, a, b, c] = self.0.to_be_bytes();
        [a, b, c]
    }

    /// Microseconds per quarter note
    pub const fn micros_per_quarter_note(&self) -> u32 {
        self.0
    }

    /// Beats per minute, rounded down. 0 if the tempo field is zero.
    pub const fn bpm(&self) -> u32 {
        match 60_000_000u32.checked_div(self.0) {
            Some(bpm) => bpm,
            None => 0,
        }
    }
}

#[doc = r#"
A decoded meta event

Each sub-type is its own variant. The seven text kinds share a shape (the raw
bytes, which are usually but not always UTF-8 or ASCII); see [`MetaEvent::text`].
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaEvent {
    /// Pattern number. An empty payload means "use the track's index".
    SequenceNumber(Option<u16>),
    /// Any text
    Text(Vec<u8>),
    /// A copyright notice
    Copyright(Vec<u8>),
    /// Sequence or track name
    TrackName(Vec<u8>),
    /// Instrument name
    InstrumentName(Vec<u8>),
    /// A lyric
    Lyric(Vec<u8>),
    /// A marker
    Marker(Vec<u8>),
    /// A cue point
    CuePoint(Vec<u8>),
    /// Channel that following meta and sysex events refer to
    ChannelPrefix(Channel),
    /// Output port for the track
    MidiPort(u8),
    /// Last event of every track
    EndOfTrack,
    /// Tempo change
    Tempo(Tempo),
    /// Starting time of the track
    SmpteOffset(SmpteOffset),
    /// Time signature change
    TimeSignature(TimeSignature),
    /// Key signature change
    KeySignature(KeySignature),
    /// Data for a particular sequencer
    SequencerSpecific(Vec<u8>),
    /// A meta type this crate does not interpret
    Unknown {
        /// The sub-type byte
        kind: u8,
        /// The payload
        data: Vec<u8>,
    },
}

impl MetaEvent {
    /// Build the variant for a text kind.
    pub fn from_text(kind: TextType, text: Vec<u8>) -> Self {
        match kind {
            TextType::Text => Self::Text(text),
            TextType::Copyright => Self::Copyright(text),
            TextType::TrackName => Self::TrackName(text),
            TextType::InstrumentName => Self::InstrumentName(text),
            TextType::Lyric => Self::Lyric(text),
            TextType::Marker => Self::Marker(text),
            TextType::CuePoint => Self::CuePoint(text),
        }
    }

    /// The sub-type byte of this event.
    pub fn kind(&self) -> u8 {
        let known = match self {
            Self::SequenceNumber(_) => MetaType::SequenceNumber,
            Self::Text(_) => MetaType::Text,
            Self::Copyright(_) => MetaType::Copyright,
            Self::TrackName(_) => MetaType::TrackName,
            Self::InstrumentName(_) => MetaType::InstrumentName,
            Self::Lyric(_) => MetaType::Lyric,
            Self::Marker(_) => MetaType::Marker,
            Self::CuePoint(_) => MetaType::CuePoint,
            Self::ChannelPrefix(_) => MetaType::ChannelPrefix,
            Self::MidiPort(_) => MetaType::MidiPort,
            Self::EndOfTrack => MetaType::EndOfTrack,
            Self::Tempo(_) => MetaType::Tempo,
            Self::SmpteOffset(_) => MetaType::SmpteOffset,
            Self::TimeSignature(_) => MetaType::TimeSignature,
            Self::KeySignature(_) => MetaType::KeySignature,
            Self::SequencerSpecific(_) => MetaType::SequencerSpecific,
            Self::Unknown { kind, .. } => return *kind,
        };
        known.into()
    }

    /// The text kind and bytes, for the seven text variants.
    pub fn text(&self) -> Option<(TextType, &[u8])> {
        let (kind, text) = match self {
            Self::Text(t) => (TextType::Text, t),
            Self::Copyright(t) => (TextType::Copyright, t),
            Self::TrackName(t) => (TextType::TrackName, t),
            Self::InstrumentName(t) => (TextType::InstrumentName, t),
            Self::Lyric(t) => (TextType::Lyric, t),
            Self::Marker(t) => (TextType::Marker, t),
            Self::CuePoint(t) => (TextType::CuePoint, t),
            _ => return None,
        };
        Some((kind, text.as_slice()))
    }

    /// The text as a string slice, if this is a text variant holding valid UTF-8.
    pub fn text_str(&self) -> Option<&str> {
        self.text()
            .and_then(|(_, bytes)| core::str::from_utf8(bytes).ok())
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self {
            Self::Text(b)
            | Self::Copyright(b)
            | Self::TrackName(b)
            | Self::InstrumentName(b)
            | Self::Lyric(b)
            | Self::Marker(b)
            | Self::CuePoint(b)
            | Self::SequencerSpecific(b)
            | Self::Unknown { data: b, .. } => Some(b),
            _ => None,
        }
    }
}

#[test]
fn tempo_conversions() {
    use pretty_assertions::assert_eq;
    let tempo = Tempo::from_bpm(120).unwrap();
    assert_eq!(tempo.micros_per_quarter_note(), 500_000);
    assert_eq!(tempo.to_bytes(), [0x07, 0xA1, 0x20]);
    assert_eq!(Tempo::from_bytes([0x07, 0xA1, 0x20]).bpm(), 120);
    // 60_000_000 / 90 = 666_666, and back gives 90
    assert_eq!(Tempo::from_bpm(90).unwrap().bpm(), 90);
    assert_eq!(Tempo::from_bpm(0), None);
    assert_eq!(Tempo::from_bpm(1).unwrap().micros_per_quarter_note(), Tempo::MAX_MICROS);
    assert_eq!(Tempo::new(0).bpm(), 0);
}

#[test]
fn text_accessors() {
    use pretty_assertions::assert_eq;
    let meta = MetaEvent::from_text(TextType::Marker, b"Verse".to_vec());
    assert_eq!(meta.kind(), 0x06);
    assert_eq!(meta.text(), Some((TextType::Marker, &b"Verse"[..])));
    assert_eq!(meta.text_str(), Some("Verse"));
    assert_eq!(MetaEvent::EndOfTrack.text(), None);
    assert_eq!(
        MetaEvent::Unknown {
            kind: 0x09,
            data: Vec::new()
        }
        .kind(),
        0x09
    );
}
