use super::{ReadOptions, ReadResult, ReaderError, ReaderErrorKind};
use crate::{
    message::{
        Channel, Event, Message, MessageType,
        meta::{
            KeySignature, MetaEvent, MetaType, SmpteError, SmpteOffset, Tempo, TextType,
            TimeSignature,
        },
    },
    source::ByteSource,
    vlq::{self, VlqError},
};
use alloc::vec::Vec;

/// Largest fixed-size meta payload that is interpreted (the SMPTE offset).
const FIXED_META_LEN: usize = 5;

#[doc = r#"
Read state of one track chunk

`start..end` is the chunk body inside the source. `offset` is the next unread
byte, `position` the absolute tick of the last message read, and
`running_status` the channel status a data byte will repeat.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackCursor {
    start: usize,
    end: usize,
    offset: usize,
    position: u32,
    running_status: Option<u8>,
}

impl TrackCursor {
    pub(crate) const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            offset: start,
            position: 0,
            running_status: None,
        }
    }

    /// Offset of the first byte of the chunk body
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte of the chunk body
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Offset of the next unread byte
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute tick of the last message read
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// The status byte repeated by running status, if any
    pub const fn running_status(&self) -> Option<u8> {
        self.running_status
    }

    /// True once every byte of the chunk has been consumed
    pub const fn is_at_end(&self) -> bool {
        self.offset >= self.end
    }

    pub(crate) fn rewind(&mut self) {
        *self = Self::new(self.start, self.end);
    }

    /// Decode the next message into `message`.
    ///
    /// The cursor and `message` only change if the whole message decodes,
    /// except that an I/O failure mid-payload loses the old payload bytes. At
    /// the end of the chunk this returns an end-of-track error.
    pub(crate) fn decode<S: ByteSource>(
        &mut self,
        source: &mut S,
        options: &ReadOptions,
        message: &mut Message,
    ) -> ReadResult<()> {
        if self.is_at_end() {
            return Err(ReaderError::end_of_track(self.offset));
        }
        let mut next = *self;
        let mut buf = message.take_buffer();
        let decoded = next.read_vlq(source).and_then(|delta| {
            let event_start = next.offset;
            next.read_event(source, options, &mut buf)
                .map(|(event, implied)| (delta, event_start, event, implied))
        });
        let (delta, event_start, event, implied) = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                message.restore_buffer(buf);
                return Err(e);
            }
        };

        next.position = next.position.saturating_add(delta);
        message.delta = delta;
        message.position = next.position;
        message.size = (next.offset - event_start) as u32;
        message.implied = implied;
        message.event = event;
        *self = next;
        Ok(())
    }

    fn read_event<S: ByteSource>(
        &mut self,
        source: &mut S,
        options: &ReadOptions,
        buf: &mut Vec<u8>,
    ) -> ReadResult<(Event, bool)> {
        let first = self.peek_byte(source)?;
        let (status, implied) = if first & 0x80 != 0 {
            self.offset += 1;
            (first, false)
        } else {
            let status = self
                .running_status
                .ok_or_else(|| ReaderError::new(self.offset, ReaderErrorKind::NoRunningStatus))?;
            (status, true)
        };
        let status_offset = self.offset - usize::from(!implied);
        let unknown = || ReaderError::new(status_offset, ReaderErrorKind::UnknownStatus(status));
        let kind = MessageType::from_status(status).ok_or_else(unknown)?;

        let event = match kind {
            MessageType::Meta => {
                let meta_kind = self.read_byte(source)?;
                let len = self.read_vlq(source)? as usize;
                Event::Meta(self.read_meta(source, options, meta_kind, len, buf)?)
            }
            MessageType::SysEx | MessageType::SysExEscape => {
                let len = self.read_vlq(source)? as usize;
                self.read_payload(source, len, len, buf)?;
                let data = core::mem::take(buf);
                if kind == MessageType::SysEx {
                    Event::SysEx(data)
                } else {
                    Event::SysExEscape(data)
                }
            }
            _ => {
                let mut data = [0u8; 2];
                for byte in data.iter_mut().take(kind.data_len()) {
                    *byte = self.read_byte(source)?;
                }
                let event = Event::from_channel_bytes(status, data).ok_or_else(unknown)?;
                self.running_status = Some(status);
                event
            }
        };
        Ok((event, implied))
    }

    fn read_meta<S: ByteSource>(
        &mut self,
        source: &mut S,
        options: &ReadOptions,
        kind: u8,
        len: usize,
        buf: &mut Vec<u8>,
    ) -> ReadResult<MetaEvent> {
        let payload_offset = self.offset;
        let too_short = || ReaderError::new(payload_offset, ReaderErrorKind::MetaLength { kind, len });

        let Ok(known) = MetaType::try_from(kind) else {
            self.read_payload(source, len, len, buf)?;
            return Ok(MetaEvent::Unknown {
                kind,
                data: core::mem::take(buf),
            });
        };

        if let Ok(text) = TextType::try_from(kind) {
            let keep = options.text_capacity.saturating_sub(1);
            self.read_payload(source, len, keep, buf)?;
            return Ok(MetaEvent::from_text(text, core::mem::take(buf)));
        }

        if known == MetaType::SequencerSpecific {
            self.read_payload(source, len, len, buf)?;
            return Ok(MetaEvent::SequencerSpecific(core::mem::take(buf)));
        }

        let mut fixed = [0u8; FIXED_META_LEN];
        let kept = len.min(FIXED_META_LEN);
        self.read_fixed(source, len, &mut fixed[..kept])?;
        let data = &fixed[..kept];

        let meta = match known {
            MetaType::SequenceNumber => match len {
                0 => MetaEvent::SequenceNumber(None),
                1 => return Err(too_short()),
                _ => MetaEvent::SequenceNumber(Some(u16::from_be_bytes([data[0], data[1]]))),
            },
            MetaType::ChannelPrefix => {
                let &channel = data.first().ok_or_else(too_short)?;
                MetaEvent::ChannelPrefix(Channel::from_status(channel))
            }
            MetaType::MidiPort => MetaEvent::MidiPort(*data.first().ok_or_else(too_short)?),
            MetaType::EndOfTrack => MetaEvent::EndOfTrack,
            MetaType::Tempo => match data {
                [a, b, c, ..] => MetaEvent::Tempo(Tempo::from_bytes([*a, *b, *c])),
                _ => return Err(too_short()),
            },
            MetaType::SmpteOffset => {
                if len != FIXED_META_LEN {
                    return Err(ReaderError::new(
                        payload_offset,
                        SmpteError::Length(len).into(),
                    ));
                }
                let offset = SmpteOffset::parse(data)
                    .map_err(|e| ReaderError::new(payload_offset, e.into()))?;
                MetaEvent::SmpteOffset(offset)
            }
            MetaType::TimeSignature => {
                MetaEvent::TimeSignature(TimeSignature::from_bytes(data).ok_or_else(too_short)?)
            }
            MetaType::KeySignature => match data {
                [sf, mi, ..] => MetaEvent::KeySignature(KeySignature::from_bytes(*sf, *mi)),
                _ => return Err(too_short()),
            },
            // text kinds and sequencer-specific are handled above
            _ => MetaEvent::Unknown {
                kind,
                data: data.to_vec(),
            },
        };
        Ok(meta)
    }

    fn remaining(&self) -> usize {
        self.end.saturating_sub(self.offset)
    }

    fn peek_byte<S: ByteSource>(&self, source: &mut S) -> ReadResult<u8> {
        if self.is_at_end() {
            return Err(ReaderError::oob(self.offset));
        }
        source.read_u8(self.offset)
    }

    fn read_byte<S: ByteSource>(&mut self, source: &mut S) -> ReadResult<u8> {
        let byte = self.peek_byte(source)?;
        self.offset += 1;
        Ok(byte)
    }

    /// Read a variable-length quantity without looking past the chunk.
    fn read_vlq<S: ByteSource>(&mut self, source: &mut S) -> ReadResult<u32> {
        let available = self.remaining().min(vlq::MAX_LEN);
        let mut bytes = [0u8; vlq::MAX_LEN];
        source.read_at(self.offset, &mut bytes[..available])?;
        let (value, used) = vlq::decode(&bytes[..available]).map_err(|e| match e {
            VlqError::Unterminated if available < vlq::MAX_LEN => ReaderError::oob(self.offset),
            e => ReaderError::new(self.offset, e.into()),
        })?;
        self.offset += used;
        Ok(value)
    }

    /// Consume `len` bytes, keeping at most `keep` of them in `buf`.
    ///
    /// `buf` is only overwritten once the payload is known to fit the chunk, so
    /// just a failing source can leave it emptied.
    fn read_payload<S: ByteSource>(
        &mut self,
        source: &mut S,
        len: usize,
        keep: usize,
        buf: &mut Vec<u8>,
    ) -> ReadResult<()> {
        if len > self.remaining() {
            return Err(ReaderError::oob(self.offset));
        }
        buf.clear();
        buf.resize(len.min(keep), 0);
        source.read_at(self.offset, buf)?;
        self.offset += len;
        Ok(())
    }

    /// Consume `len` bytes, copying the first `out.len()` of them.
    fn read_fixed<S: ByteSource>(
        &mut self,
        source: &mut S,
        len: usize,
        out: &mut [u8],
    ) -> ReadResult<()> {
        if len > self.remaining() {
            return Err(ReaderError::oob(self.offset));
        }
        source.read_at(self.offset, out)?;
        self.offset += len;
        Ok(())
    }
}

#[cfg(test)]
fn decode_all(body: &[u8]) -> (TrackCursor, alloc::vec::Vec<ReadResult<Message>>) {
    use crate::source::SliceSource;
    let mut source = SliceSource::new(body);
    let mut cursor = TrackCursor::new(0, body.len());
    let options = ReadOptions::default();
    let mut out = alloc::vec::Vec::new();
    loop {
        let mut message = Message::default();
        match cursor.decode(&mut source, &options, &mut message) {
            Ok(()) => out.push(Ok(message)),
            Err(e) if e.is_end_of_track() => break,
            Err(e) => {
                out.push(Err(e));
                break;
            }
        }
    }
    (cursor, out)
}

#[test]
fn running_status_repeats_the_last_channel_status() {
    use pretty_assertions::assert_eq;
    let body = [
        0x00, 0x90, 0x3C, 0x64, // note on
        0x10, 0x3E, 0x64, // implied note on
        0x10, 0x3C, 0x00, // implied note on, velocity 0
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let (cursor, messages) = decode_all(&body);
    let messages: alloc::vec::Vec<Message> = messages.into_iter().map(Result::unwrap).collect();
    assert_eq!(messages.len(), 4);

    assert!(!messages[0].is_implied());
    assert_eq!(messages[0].size(), 3);
    assert!(messages[1].is_implied());
    assert_eq!(messages[1].size(), 2);
    assert_eq!(messages[1].position(), 0x10);
    assert_eq!(
        messages[1].event(),
        &Event::NoteOn {
            channel: Channel::One,
            note: 0x3E,
            velocity: 0x64
        }
    );
    assert!(messages[2].event().is_note_off());
    assert_eq!(messages[2].position(), 0x20);
    assert_eq!(messages[3].event(), &Event::Meta(MetaEvent::EndOfTrack));
    assert_eq!(cursor.running_status(), Some(0x90));
    assert!(cursor.is_at_end());
}

#[test]
fn meta_events_do_not_cancel_running_status() {
    use pretty_assertions::assert_eq;
    let body = [
        0x00, 0xB1, 0x07, 0x64, // volume
        0x00, 0xFF, 0x01, 0x02, b'h', b'i', // text
        0x00, 0x0A, 0x40, // implied control change
    ];
    let (_, messages) = decode_all(&body);
    assert_eq!(
        messages[2].as_ref().unwrap().event(),
        &Event::ControlChange {
            channel: Channel::Two,
            controller: 0x0A,
            value: 0x40
        }
    );
}

#[test]
fn data_byte_without_status_is_an_error() {
    let (cursor, messages) = decode_all(&[0x00, 0x3C, 0x64]);
    let err = messages[0].as_ref().unwrap_err();
    assert!(matches!(err.error_kind(), ReaderErrorKind::NoRunningStatus));
    assert_eq!(cursor.offset(), 0);
}

#[test]
fn decoding_stops_at_the_chunk_end() {
    use crate::source::SliceSource;
    use pretty_assertions::assert_eq;
    // the chunk is the first four bytes; the rest belongs to something else
    let bytes = [0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20];
    let mut source = SliceSource::new(&bytes[..]);
    let mut cursor = TrackCursor::new(0, 4);
    let mut message = Message::default();
    let err = cursor
        .decode(&mut source, &ReadOptions::default(), &mut message)
        .unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(cursor.offset(), 0);
}

#[test]
fn text_is_truncated_to_the_capacity() {
    use crate::source::SliceSource;
    use pretty_assertions::assert_eq;
    let body = [0x00, 0xFF, 0x03, 0x08, b'A', b'B', b'C', b'D', b'E', b'F', b'G', b'H'];
    let mut source = SliceSource::new(&body[..]);
    let mut cursor = TrackCursor::new(0, body.len());
    let options = ReadOptions::default().with_text_capacity(4);
    let mut message = Message::default();
    cursor.decode(&mut source, &options, &mut message).unwrap();
    assert_eq!(
        message.event(),
        &Event::Meta(MetaEvent::TrackName(b"ABC".to_vec()))
    );
    // the whole payload is consumed anyway
    assert!(cursor.is_at_end());
    assert_eq!(message.size(), 11);
}

#[test]
fn fixed_meta_payloads() {
    use pretty_assertions::assert_eq;
    let body = [
        0x00, 0xFF, 0x00, 0x02, 0x00, 0x07, // sequence number 7
        0x00, 0xFF, 0x20, 0x01, 0x09, // channel prefix
        0x00, 0xFF, 0x21, 0x01, 0x02, // port
        0x00, 0xFF, 0x58, 0x04, 0x06, 0x03, 0x18, 0x08, // 6/8
        0x00, 0xFF, 0x59, 0x02, 0xFD, 0x01, // 3 flats minor
        0x00, 0xFF, 0x54, 0x05, 0x41, 0x17, 0x2D, 0x0C, 0x22, // smpte offset
        0x00, 0xFF, 0x60, 0x01, 0xAA, // unknown
    ];
    let (_, messages) = decode_all(&body);
    let events: alloc::vec::Vec<Event> = messages
        .into_iter()
        .map(|m| m.unwrap().into_event())
        .collect();
    assert_eq!(
        events,
        alloc::vec![
            Event::Meta(MetaEvent::SequenceNumber(Some(7))),
            Event::Meta(MetaEvent::ChannelPrefix(Channel::Ten)),
            Event::Meta(MetaEvent::MidiPort(2)),
            Event::Meta(MetaEvent::TimeSignature(TimeSignature::new(6, 8).unwrap())),
            Event::Meta(MetaEvent::KeySignature(KeySignature::new(-3, true).unwrap())),
            Event::Meta(MetaEvent::SmpteOffset(
                SmpteOffset::parse(&[0x41, 0x17, 0x2D, 0x0C, 0x22]).unwrap()
            )),
            Event::Meta(MetaEvent::Unknown {
                kind: 0x60,
                data: alloc::vec![0xAA]
            }),
        ]
    );
}

#[test]
fn short_tempo_payload_is_rejected() {
    let (_, messages) = decode_all(&[0x00, 0xFF, 0x51, 0x02, 0x07, 0xA1]);
    let err = messages[0].as_ref().unwrap_err();
    assert!(matches!(
        err.error_kind(),
        ReaderErrorKind::MetaLength { kind: 0x51, len: 2 }
    ));
}

#[test]
fn sysex_payload_is_kept_whole() {
    use pretty_assertions::assert_eq;
    let body = [0x05, 0xF0, 0x04, 0x43, 0x12, 0x00, 0xF7];
    let (_, messages) = decode_all(&body);
    let message = messages[0].as_ref().unwrap();
    assert_eq!(message.delta(), 5);
    assert_eq!(
        message.event(),
        &Event::SysEx(alloc::vec![0x43, 0x12, 0x00, 0xF7])
    );
    assert_eq!(message.size(), 6);
}

#[test]
fn escape_blocks_keep_their_status() {
    use pretty_assertions::assert_eq;
    let (_, messages) = decode_all(&[0x00, 0xF7, 0x02, 0x01, 0x02]);
    let message = messages[0].as_ref().unwrap();
    assert_eq!(message.kind(), MessageType::SysExEscape);
    assert_eq!(u8::from(message.kind()), 0xF7);
    assert_eq!(message.event(), &Event::SysExEscape(alloc::vec![0x01, 0x02]));
    assert_eq!(message.size(), 4);
}

#[test]
fn failed_decode_leaves_the_message_alone() {
    use crate::source::SliceSource;
    use pretty_assertions::assert_eq;
    let body = [
        0x00, 0xFF, 0x01, 0x02, b'h', b'i', // text
        0x00, 0xFF, 0x51, 0x03, 0x07, // tempo cut short by the chunk end
    ];
    let mut source = SliceSource::new(&body[..]);
    let mut cursor = TrackCursor::new(0, body.len());
    let options = ReadOptions::default();
    let mut message = Message::default();
    cursor.decode(&mut source, &options, &mut message).unwrap();
    let before = message.clone();

    let err = cursor.decode(&mut source, &options, &mut message).unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(message, before);
    assert_eq!(message.event(), &Event::Meta(MetaEvent::Text(b"hi".to_vec())));
    assert_eq!(cursor.offset(), 6);
}

#[test]
fn system_realtime_status_is_rejected() {
    let (_, messages) = decode_all(&[0x00, 0xF8]);
    assert!(matches!(
        messages[0].as_ref().unwrap_err().error_kind(),
        ReaderErrorKind::UnknownStatus(0xF8)
    ));
}
