#![doc = r#"
File-level framing of a Standard MIDI File

# Overview

MIDI files are organized into chunks, each identified by a 4-character ASCII type
identifier followed by a 32-bit big-endian length and then the chunk data.

```text
[Header Chunk: "MThd", length 6, format, track count, division]
[Track Chunk 1: "MTrk", length, (delta-time, event)*]
[Track Chunk 2: "MTrk", length, (delta-time, event)*]
...
[Track Chunk N: "MTrk", length, (delta-time, event)*]
```

The header is always the first chunk. Any chunk whose identifier is not `MTrk`
is skipped by the reader.
"#]

mod header;
pub use header::*;

mod timing;
pub use timing::*;

mod note_length;
pub use note_length::*;

/// Identifier of the header chunk
pub const HEADER_MAGIC: [u8; 4] = *b"MThd";

/// Identifier of a track chunk
pub const TRACK_MAGIC: [u8; 4] = *b"MTrk";

/// Size of a chunk's identifier plus its length field
pub const CHUNK_PREFIX_LEN: usize = 8;

/// Pulses per quarter note used when none is configured
pub const DEFAULT_PPQN: u16 = 384;
