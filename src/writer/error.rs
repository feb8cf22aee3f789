use crate::message::{MessageType, meta::SmpteError};
use alloc::collections::TryReserveError;
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while building a MIDI file

Arguments are checked before anything is written, so a failed call leaves the
document exactly as it was.
"#]
#[derive(Debug, Error)]
pub enum WriterError {
    /// The track index is at or above the writer's track limit.
    #[error("Track {0} is out of range")]
    InvalidTrack(usize),
    /// Channels are numbered 1 to 16.
    #[error("Channel {0} is not between 1 and 16")]
    InvalidChannel(u8),
    /// Notes are numbered 0 to 127.
    #[error("Note {0} is not between 0 and 127")]
    InvalidNote(u8),
    /// Only channel voice messages can be added this way.
    #[error("{0:?} is not a channel voice message")]
    InvalidMessageType(MessageType),
    /// Every note slot of the track holds a sounding note.
    #[error("Track {track} already has {polyphony} notes sounding")]
    PolyphonyExceeded {
        /// The track
        track: usize,
        /// Its number of note slots
        polyphony: usize,
    },
    /// A track buffer could not grow.
    #[error("Could not grow the track buffer: {0}")]
    AllocationFailure(#[from] TryReserveError),
    /// Tempo of zero beats per minute
    #[error("Invalid tempo of {0} BPM")]
    InvalidTempo(u32),
    /// Resolution must be between 1 and 32767 ticks per quarter note.
    #[error("Invalid resolution of {0} ticks per quarter note")]
    InvalidPpqn(u16),
    /// Numerator of zero, or a denominator that is not a power of two
    #[error("Invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature {
        /// Beats per bar
        numerator: u8,
        /// Beat unit
        denominator: u8,
    },
    /// More than seven sharps or flats
    #[error("Invalid key signature {0}")]
    InvalidKeySignature(i8),
    /// A track body too long for the 32-bit chunk length
    #[error("Track {track} holds {len} bytes, more than a chunk can")]
    ChunkTooLong {
        /// The track
        track: usize,
        /// Bytes in the track
        len: usize,
    },
    /// An invalid SMPTE offset
    #[error("{0}")]
    Smpte(#[from] SmpteError),
    /// The file could not be written.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The Write Result type (see [`WriterError`])
pub type WriteResult<T> = Result<T, WriterError>;
