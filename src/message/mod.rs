#![doc = r#"
Decoded and to-be-encoded MIDI events

# Hierarchy
```text
                     |---------|
                     | Message |   delta-time, absolute position, size
                     |---------|
                          |
                      |-------|
                      | Event |
                      |-------|
              /           |            \
|---------------|  |------------|  |------------------|
| Channel Voice |  | Meta Event |  | System Exclusive |
|---------------|  |------------|  |------------------|
```
"#]

mod channel;
pub use channel::*;

pub mod meta;

use alloc::vec::Vec;
use meta::MetaEvent;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Centre of the pitch wheel's unsigned 14-bit range
pub const PITCH_WHEEL_CENTRE: u16 = 0x2000;

#[doc = r#"
The kind of a message, as found in the top nibble of a channel status byte or
as the whole byte for system messages
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    /// 0x8n
    NoteOff = 0x80,
    /// 0x9n
    NoteOn = 0x90,
    /// 0xAn, polyphonic key pressure
    KeyPressure = 0xA0,
    /// 0xBn
    ControlChange = 0xB0,
    /// 0xCn
    ProgramChange = 0xC0,
    /// 0xDn
    ChannelPressure = 0xD0,
    /// 0xEn
    PitchWheel = 0xE0,
    /// 0xF0
    SysEx = 0xF0,
    /// 0xF7, a system exclusive continuation or escape
    SysExEscape = 0xF7,
    /// 0xFF
    Meta = 0xFF,
}

impl MessageType {
    /// Identify the message kind of a status byte.
    ///
    /// Returns `None` for data bytes and for system messages that cannot appear
    /// in a track.
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            0x80..=0xEF => Self::try_from(status & 0xF0).ok(),
            0xF0 | 0xF7 | 0xFF => Self::try_from(status).ok(),
            _ => None,
        }
    }

    /// True for the seven channel voice kinds.
    pub const fn is_channel_voice(&self) -> bool {
        !matches!(self, Self::SysEx | Self::SysExEscape | Self::Meta)
    }

    /// Number of data bytes following the status of a channel voice message.
    ///
    /// System kinds carry a length-prefixed payload and report 0.
    pub const fn data_len(&self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            Self::SysEx | Self::SysExEscape | Self::Meta => 0,
            _ => 2,
        }
    }
}

#[doc = r#"
The payload of a [`Message`]
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Start a note. A velocity of zero is commonly used in place of a note-off.
    NoteOn {
        /// Channel
        channel: Channel,
        /// Key, 0-127
        note: u8,
        /// Strike velocity, 0-127
        velocity: u8,
    },
    /// Stop a note.
    NoteOff {
        /// Channel
        channel: Channel,
        /// Key, 0-127
        note: u8,
    },
    /// Polyphonic aftertouch on one key.
    KeyPressure {
        /// Channel
        channel: Channel,
        /// Key, 0-127
        note: u8,
        /// Pressure, 0-127
        pressure: u8,
    },
    /// Set a controller.
    ControlChange {
        /// Channel
        channel: Channel,
        /// Controller number, 0-127
        controller: u8,
        /// New value, 0-127
        value: u8,
    },
    /// Select an instrument.
    ProgramChange {
        /// Channel
        channel: Channel,
        /// Program number, 0-127
        program: u8,
    },
    /// Aftertouch for the whole channel.
    ChannelPressure {
        /// Channel
        channel: Channel,
        /// Pressure, 0-127
        pressure: u8,
    },
    /// Bend the pitch of the channel.
    PitchWheel {
        /// Channel
        channel: Channel,
        /// Signed 14-bit value, `-8192..=8191`, zero is no bend
        value: i16,
    },
    /// A meta event
    Meta(MetaEvent),
    /// A system exclusive block, without its status or length
    SysEx(Vec<u8>),
    /// An `F7` block: a system exclusive continuation or escaped bytes
    SysExEscape(Vec<u8>),
}

impl Default for Event {
    /// An empty end-of-track event
    fn default() -> Self {
        Self::Meta(MetaEvent::EndOfTrack)
    }
}

impl Event {
    /// The message kind of this event.
    pub const fn kind(&self) -> MessageType {
        match self {
            Self::NoteOn { .. } => MessageType::NoteOn,
            Self::NoteOff { .. } => MessageType::NoteOff,
            Self::KeyPressure { .. } => MessageType::KeyPressure,
            Self::ControlChange { .. } => MessageType::ControlChange,
            Self::ProgramChange { .. } => MessageType::ProgramChange,
            Self::ChannelPressure { .. } => MessageType::ChannelPressure,
            Self::PitchWheel { .. } => MessageType::PitchWheel,
            Self::Meta(_) => MessageType::Meta,
            Self::SysEx(_) => MessageType::SysEx,
            Self::SysExEscape(_) => MessageType::SysExEscape,
        }
    }

    /// The channel of a channel voice event.
    pub const fn channel(&self) -> Option<Channel> {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::KeyPressure { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelPressure { channel, .. }
            | Self::PitchWheel { channel, .. } => Some(*channel),
            Self::Meta(_) | Self::SysEx(_) | Self::SysExEscape(_) => None,
        }
    }

    /// True for note-offs and for note-ons with zero velocity.
    pub const fn is_note_off(&self) -> bool {
        matches!(
            self,
            Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. }
        )
    }

    /// Decode a channel voice message from its status and (unmasked) data bytes.
    ///
    /// Returns `None` if `status` is not a channel voice status.
    pub fn from_channel_bytes(status: u8, data: [u8; 2]) -> Option<Self> {
        let kind = MessageType::from_status(status).filter(MessageType::is_channel_voice)?;
        let channel = Channel::from_status(status);
        let [a, b] = [data[0] & 0x7F, data[1] & 0x7F];
        Some(match kind {
            MessageType::NoteOn => Self::NoteOn {
                channel,
                note: a,
                velocity: b,
            },
            MessageType::NoteOff => Self::NoteOff { channel, note: a },
            MessageType::KeyPressure => Self::KeyPressure {
                channel,
                note: a,
                pressure: b,
            },
            MessageType::ControlChange => Self::ControlChange {
                channel,
                controller: a,
                value: b,
            },
            MessageType::ProgramChange => Self::ProgramChange { channel, program: a },
            MessageType::ChannelPressure => Self::ChannelPressure { channel, pressure: a },
            MessageType::PitchWheel => Self::PitchWheel {
                channel,
                value: ((a as u16 | (b as u16) << 7) as i32 - PITCH_WHEEL_CENTRE as i32) as i16,
            },
            MessageType::SysEx | MessageType::SysExEscape | MessageType::Meta => return None,
        })
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self {
            Self::SysEx(data) | Self::SysExEscape(data) => Some(data),
            Self::Meta(meta) => meta.buffer_mut(),
            _ => None,
        }
    }
}

#[doc = r#"
One timed event from a track

When reading, `delta` is the number of ticks since the previous event of the same
track and `position` the absolute tick count from the start of the track. `size`
is the number of bytes the event occupied after its delta-time; a message sent
with running status is `implied` and one byte shorter.

A single `Message` can be passed to
[`MidiReader::read_message`](crate::reader::MidiReader::read_message) over and
over: text, sequencer-specific and system exclusive payloads reuse its buffer
whenever it is large enough.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub(crate) delta: u32,
    pub(crate) position: u32,
    pub(crate) size: u32,
    pub(crate) implied: bool,
    pub(crate) event: Event,
}

impl Message {
    /// Create a message at an absolute position.
    pub fn new(delta: u32, position: u32, event: Event) -> Self {
        Self {
            delta,
            position,
            size: 0,
            implied: false,
            event,
        }
    }

    /// Ticks since the previous event in the track
    pub const fn delta(&self) -> u32 {
        self.delta
    }

    /// Ticks since the start of the track
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Bytes occupied in the track, excluding the delta-time
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// True if the message was stored without a status byte (running status)
    pub const fn is_implied(&self) -> bool {
        self.implied
    }

    /// The message kind
    pub const fn kind(&self) -> MessageType {
        self.event.kind()
    }

    /// The decoded payload
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// Take the payload
    pub fn into_event(self) -> Event {
        self.event
    }

    /// Drop any payload buffer this message holds.
    pub fn release(&mut self) {
        self.event = Event::default();
    }

    /// Lend out the payload buffer for reuse, contents and all.
    pub(crate) fn take_buffer(&mut self) -> Vec<u8> {
        self.event
            .buffer_mut()
            .map(core::mem::take)
            .unwrap_or_default()
    }

    /// Return a buffer lent out by [`Message::take_buffer`].
    pub(crate) fn restore_buffer(&mut self, buf: Vec<u8>) {
        if let Some(slot) = self.event.buffer_mut() {
            *slot = buf;
        }
    }
}

#[test]
fn channel_bytes_decode() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        Event::from_channel_bytes(0x93, [60, 100]),
        Some(Event::NoteOn {
            channel: Channel::Four,
            note: 60,
            velocity: 100
        })
    );
    assert_eq!(
        Event::from_channel_bytes(0xC0, [0x85, 0x33]),
        Some(Event::ProgramChange {
            channel: Channel::One,
            program: 5
        })
    );
    assert_eq!(
        Event::from_channel_bytes(0xE1, [0x00, 0x40]),
        Some(Event::PitchWheel {
            channel: Channel::Two,
            value: 0
        })
    );
    assert_eq!(
        Event::from_channel_bytes(0xE1, [0x00, 0x00]),
        Some(Event::PitchWheel {
            channel: Channel::Two,
            value: -8192
        })
    );
    assert_eq!(Event::from_channel_bytes(0xFF, [0, 0]), None);
    assert_eq!(Event::from_channel_bytes(0x40, [0, 0]), None);
}

#[test]
fn status_kinds() {
    use pretty_assertions::assert_eq;
    assert_eq!(MessageType::from_status(0x9F), Some(MessageType::NoteOn));
    assert_eq!(MessageType::from_status(0xF7), Some(MessageType::SysExEscape));
    assert_eq!(MessageType::from_status(0xF8), None);
    assert_eq!(MessageType::from_status(0x7F), None);
    assert_eq!(MessageType::ProgramChange.data_len(), 1);
    assert_eq!(MessageType::PitchWheel.data_len(), 2);
    assert!(!MessageType::Meta.is_channel_voice());
}

#[test]
fn zero_velocity_note_on_counts_as_note_off() {
    let off = Event::NoteOn {
        channel: Channel::One,
        note: 60,
        velocity: 0,
    };
    assert!(off.is_note_off());
    let on = Event::NoteOn {
        channel: Channel::One,
        note: 60,
        velocity: 1,
    };
    assert!(!on.is_note_off());
}
