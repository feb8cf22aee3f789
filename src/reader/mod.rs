#![doc = r#"
Contains the [`MidiReader`] and its associated constructs

# Overview

Opening a reader parses the `MThd` header and indexes every `MTrk` chunk. No
event is decoded until asked for: each track has its own [`TrackCursor`], and
[`MidiReader::read_message`] decodes the next message of one track.

```rust
# use midifile::prelude::*;
let bytes = [
    b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0x80,
    b'M', b'T', b'r', b'k', 0, 0, 0, 8,
    0x00, 0x90, 0x3C, 0x64,
    0x60, 0x3C, 0x00,
    0x00,
];
let mut reader = MidiReader::from_bytes(&bytes[..]).unwrap();
let mut message = Message::default();
reader.read_message(0, &mut message).unwrap();
assert_eq!(message.kind(), MessageType::NoteOn);

reader.read_message(0, &mut message).unwrap();
assert!(message.is_implied());
assert_eq!(message.position(), 0x60);
```

Reading past the last message of a track reports an end-of-track error, see
[`ReaderError::is_end_of_track`].
"#]

mod error;
pub use error::*;

mod cursor;
pub use cursor::*;

mod timeline;
pub use timeline::*;

use crate::{
    file::{CHUNK_PREFIX_LEN, HEADER_CHUNK_LEN, Header, TRACK_MAGIC},
    message::Message,
    source::{ByteSource, SliceSource},
};
use alloc::{borrow::Cow, vec::Vec};

/// Most tracks indexed unless configured otherwise
pub const MAX_MIDI_TRACKS: usize = 256;

/// Bytes reserved for a text event unless configured otherwise, terminator included
pub const DEFAULT_TEXT_CAPACITY: usize = 256;

/// Settings for a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadOptions {
    /// Track chunks beyond this many are ignored.
    pub max_tracks: usize,
    /// Text events keep at most `text_capacity - 1` bytes.
    pub text_capacity: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_tracks: MAX_MIDI_TRACKS,
            text_capacity: DEFAULT_TEXT_CAPACITY,
        }
    }
}

impl ReadOptions {
    /// Set the number of tracks to index
    pub const fn with_max_tracks(mut self, max_tracks: usize) -> Self {
        self.max_tracks = max_tracks;
        self
    }

    /// Set the text capacity
    pub const fn with_text_capacity(mut self, text_capacity: usize) -> Self {
        self.text_capacity = text_capacity;
        self
    }
}

#[doc = r#"
A Standard MIDI File opened for reading

Generic over where the bytes live: [`MidiReader::from_bytes`] reads memory,
`MidiReader::open` (with the `std` feature) reads a file on disk.
Dropping the reader closes it.
"#]
#[derive(Debug)]
pub struct MidiReader<S> {
    source: S,
    header: Header,
    tracks: Vec<TrackCursor>,
    options: ReadOptions,
}

impl<'a> MidiReader<SliceSource<'a>> {
    /// Read a file held in memory.
    pub fn from_bytes<B>(bytes: B) -> ReadResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
    {
        Self::with_options(SliceSource::new(bytes), ReadOptions::default())
    }

    /// Read a file held in memory with non-default settings.
    pub fn from_bytes_with<B>(bytes: B, options: ReadOptions) -> ReadResult<Self>
    where
        B: Into<Cow<'a, [u8]>>,
    {
        Self::with_options(SliceSource::new(bytes), options)
    }
}

#[cfg(feature = "std")]
impl MidiReader<crate::source::FileSource> {
    /// Open a file on disk.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> ReadResult<Self> {
        let source =
            crate::source::FileSource::open(path).map_err(ReaderError::into_header_error)?;
        Self::with_options(source, ReadOptions::default())
    }
}

impl<S: ByteSource> MidiReader<S> {
    /// Read from any byte source.
    pub fn new(source: S) -> ReadResult<Self> {
        Self::with_options(source, ReadOptions::default())
    }

    /// Parse the header and index the track chunks of `source`.
    pub fn with_options(mut source: S, options: ReadOptions) -> ReadResult<Self> {
        let mut raw = [0u8; HEADER_CHUNK_LEN];
        source
            .read_at(0, &mut raw)
            .map_err(ReaderError::into_header_error)?;
        let (header, header_len) =
            Header::parse(&raw).map_err(|e| ReaderError::new(0, e.into()))?;

        let declared = usize::from(header.num_tracks());
        if declared > options.max_tracks {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "File declares {declared} tracks, only the first {} are read",
                options.max_tracks
            );
        }
        let wanted = declared.min(options.max_tracks);

        let total = source.len();
        let mut tracks = Vec::with_capacity(wanted);
        let mut offset = CHUNK_PREFIX_LEN.saturating_add(header_len as usize);
        while tracks.len() < wanted {
            let Some(body) = offset.checked_add(CHUNK_PREFIX_LEN).filter(|&b| b <= total) else {
                break;
            };
            let mut magic = [0u8; 4];
            source.read_at(offset, &mut magic)?;
            let len = source.read_u32(offset + 4)? as usize;
            let mut end = body.saturating_add(len);
            if end > total {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Chunk at {offset} claims {len} bytes, only {} remain",
                    total - body
                );
                end = total;
            }
            if magic == TRACK_MAGIC {
                tracks.push(TrackCursor::new(body, end));
            } else {
                #[cfg(feature = "tracing")]
                tracing::warn!("Skipping unknown chunk {magic:?} at {offset}");
            }
            offset = end;
        }

        if tracks.len() < wanted {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Header declares {wanted} tracks but only {} were found",
                tracks.len()
            );
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Opened MIDI file: format {:?}, {} tracks, timing {:?}",
            header.format(),
            tracks.len(),
            header.timing()
        );

        Ok(Self {
            source,
            header,
            tracks,
            options,
        })
    }

    /// The parsed header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of track chunks that can be read
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// The settings this reader was opened with
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read state of a track
    pub fn cursor(&self, track: usize) -> ReadResult<&TrackCursor> {
        self.tracks
            .get(track)
            .ok_or(ReaderError::new(0, ReaderErrorKind::InvalidTrack(track)))
    }

    /// Go back to the first message of a track.
    pub fn rewind(&mut self, track: usize) -> ReadResult<()> {
        self.cursor_mut(track)?.rewind();
        Ok(())
    }

    /// Decode the next message of `track` into `message`.
    ///
    /// Payload buffers already held by `message` are reused. On any error,
    /// including end of track, the track's cursor is left where it was.
    pub fn read_message(&mut self, track: usize, message: &mut Message) -> ReadResult<()> {
        let cursor = self
            .tracks
            .get_mut(track)
            .ok_or(ReaderError::new(0, ReaderErrorKind::InvalidTrack(track)))?;
        cursor.decode(&mut self.source, &self.options, message)
    }

    /// Decode the next message of `track`.
    pub fn next_message(&mut self, track: usize) -> ReadResult<Message> {
        let mut message = Message::default();
        self.read_message(track, &mut message)?;
        Ok(message)
    }

    /// Iterate over the remaining messages of `track`.
    ///
    /// The iterator ends at the end of the track, or after yielding the first error.
    pub fn messages(&mut self, track: usize) -> Messages<'_, S> {
        Messages {
            reader: self,
            track,
            done: false,
        }
    }

    /// Every message of every track, in time order and stamped in microseconds.
    ///
    /// All cursors are rewound first and left at the end of their tracks.
    pub fn timeline(&mut self) -> ReadResult<Timeline> {
        let mut tracks = Vec::with_capacity(self.tracks.len());
        for track in 0..self.tracks.len() {
            self.rewind(track)?;
            let messages = self.messages(track).collect::<ReadResult<Vec<_>>>()?;
            tracks.push(messages);
        }
        Ok(Timeline::new(&self.header, tracks))
    }

    /// Release the reader and return its source.
    pub fn into_source(self) -> S {
        self.source
    }

    fn cursor_mut(&mut self, track: usize) -> ReadResult<&mut TrackCursor> {
        self.tracks
            .get_mut(track)
            .ok_or(ReaderError::new(0, ReaderErrorKind::InvalidTrack(track)))
    }
}

/// An iterator over the messages of one track, see [`MidiReader::messages`].
pub struct Messages<'r, S> {
    reader: &'r mut MidiReader<S>,
    track: usize,
    done: bool,
}

impl<S: ByteSource> Iterator for Messages<'_, S> {
    type Item = ReadResult<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_message(self.track) {
            Ok(message) => Some(Ok(message)),
            Err(e) if e.is_end_of_track() => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
fn two_track_file() -> Vec<u8> {
    let mut bytes = alloc::vec![
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0x01, 0xE0,
    ];
    bytes.extend_from_slice(b"MTrk\0\0\0\x0B");
    bytes.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x00, 0xFF, 0x2F, 0x00]);
    // a chunk nobody knows about
    bytes.extend_from_slice(b"XFIH\0\0\0\x02\xAB\xCD");
    bytes.extend_from_slice(b"MTrk\0\0\0\x0C");
    bytes.extend_from_slice(&[
        0x00, 0xC0, 0x05, 0x83, 0x60, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00,
    ]);
    bytes
}

#[test]
fn unknown_chunks_are_skipped() {
    use pretty_assertions::assert_eq;
    let mut reader = MidiReader::from_bytes(two_track_file()).unwrap();
    assert_eq!(reader.num_tracks(), 2);
    assert_eq!(reader.cursor(1).unwrap().start(), 14 + 8 + 11 + 10 + 8);

    let messages = reader
        .messages(1)
        .collect::<ReadResult<Vec<_>>>()
        .unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].delta(), 480);
    assert_eq!(messages[1].position(), 480);
}

#[test]
fn end_of_track_leaves_the_cursor_alone() {
    use pretty_assertions::assert_eq;
    let mut reader = MidiReader::from_bytes(two_track_file()).unwrap();
    let mut message = Message::default();
    reader.read_message(0, &mut message).unwrap();
    reader.read_message(0, &mut message).unwrap();
    let before = *reader.cursor(0).unwrap();

    let err = reader.read_message(0, &mut message).unwrap_err();
    assert!(err.is_end_of_track());
    assert_eq!(*reader.cursor(0).unwrap(), before);
    assert!(reader.read_message(0, &mut message).unwrap_err().is_end_of_track());

    reader.rewind(0).unwrap();
    reader.read_message(0, &mut message).unwrap();
    assert_eq!(message.position(), 0);
}

#[test]
fn missing_tracks_are_reported() {
    let mut reader = MidiReader::from_bytes(two_track_file()).unwrap();
    let err = reader.next_message(2).unwrap_err();
    assert!(matches!(err.error_kind(), ReaderErrorKind::InvalidTrack(2)));
}

#[test]
fn max_tracks_limits_the_index() {
    use pretty_assertions::assert_eq;
    let options = ReadOptions::default().with_max_tracks(1);
    let reader = MidiReader::from_bytes_with(two_track_file(), options).unwrap();
    assert_eq!(reader.num_tracks(), 1);
    assert_eq!(reader.header().num_tracks(), 2);
}

#[test]
fn overlong_chunk_is_clamped_to_the_source() {
    use pretty_assertions::assert_eq;
    let mut bytes = two_track_file();
    let len = bytes.len();
    // cut the end-of-track event short
    bytes.truncate(len - 2);
    let mut reader = MidiReader::from_bytes(bytes).unwrap();
    assert_eq!(reader.cursor(1).unwrap().end(), len - 2);
    let results: Vec<_> = reader.messages(1).collect();
    assert_eq!(results.len(), 3);
    assert!(results[2].as_ref().unwrap_err().is_out_of_bounds());
}

#[test]
fn bad_headers_fail_to_open() {
    use crate::file::HeaderError;
    let err = MidiReader::from_bytes(&b"MThd\0\0"[..]).unwrap_err();
    assert!(err.is_invalid_header());
    assert!(matches!(
        err.error_kind(),
        ReaderErrorKind::InvalidHeader(HeaderError::Truncated)
    ));

    let err = MidiReader::from_bytes(&b"RIFF\0\0\0\x06\0\x01\0\x01\x01\x80"[..]).unwrap_err();
    assert!(matches!(
        err.error_kind(),
        ReaderErrorKind::InvalidHeader(HeaderError::Magic(_))
    ));
}
