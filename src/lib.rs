#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]
#![doc = r#"
A byte-level codec for Standard MIDI Files (SMF format 0 and 1).

The crate has two halves that share one message model:

- [`MidiReader`](crate::reader::MidiReader) indexes the chunks of a file and then decodes
  one [`Message`](crate::message::Message) at a time from any track, keeping running
  status per track.
- [`MidiWriter`](crate::writer::MidiWriter) appends encoded events to per-track buffers,
  schedules note-offs for you, and serializes the header and every track chunk
  when it is finished.

# Example
```rust
use midifile::prelude::*;

let mut writer = MidiWriter::new();
writer.set_ppqn(480).unwrap();
writer.add_tempo(0, 120).unwrap();
writer.add_note(0, 60, NoteLength::Crochet, 100, true).unwrap();
let bytes = writer.finish().unwrap();

let mut reader = MidiReader::from_bytes(bytes).unwrap();
assert_eq!(reader.header().ppqn(), Some(480));

let mut message = Message::default();
reader.read_message(0, &mut message).unwrap();
assert!(matches!(message.event(), Event::Meta(MetaEvent::Tempo(_))));
```
"#]

extern crate alloc;

pub mod file;
pub mod message;
pub mod reader;
pub mod source;
pub mod vlq;
pub mod writer;

mod micros;
pub use micros::*;

#[doc = r#"
Commonly used types, in one import
"#]
pub mod prelude {
    pub use crate::{
        file::{FormatType, Header, NoteLength, SmpteFps, Timing},
        message::{
            Channel, Event, Message, MessageType,
            meta::{
                KeySignature, MetaEvent, MetaType, SmpteError, SmpteOffset, Tempo, TextType,
                TimeSignature,
            },
        },
        micros::UMicros,
        reader::{
            Messages, MidiReader, ReadOptions, ReadResult, ReaderError, ReaderErrorKind, Timed,
            Timeline, TrackCursor,
        },
        source::{ByteSource, SliceSource},
        writer::{FlushTo, MidiWriter, WriteResult, WriterError, WriterOptions},
    };

    #[cfg(feature = "std")]
    pub use crate::source::FileSource;
}
