use crate::{file::HeaderError, message::meta::SmpteError, vlq::VlqError};
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while reading a MIDI file
"#]
#[derive(Debug, Error)]
#[error("Reading at Position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce
#[derive(Debug, Error)]
pub enum ReaderErrorKind {
    /// The `MThd` chunk is missing, malformed or truncated.
    #[error("Invalid header: {0}")]
    InvalidHeader(#[from] HeaderError),
    /// No such track in this file.
    #[error("Track {0} does not exist")]
    InvalidTrack(usize),
    /// The track cursor is at the end of its chunk. Not a failure; there is
    /// simply nothing more to read.
    #[error("End of track")]
    EndOfTrack,
    /// Reading out of bounds, past the end of the track's chunk or of the source.
    #[error("Read out of bounds!")]
    OutOfBounds,
    /// A malformed variable-length quantity
    #[error("{0}")]
    Vlq(#[from] VlqError),
    /// A data byte arrived before any channel status to repeat.
    #[error("Data byte with no running status")]
    NoRunningStatus,
    /// A status byte that has no meaning inside a track.
    #[error("Status {0:#04X} cannot appear in a track")]
    UnknownStatus(u8),
    /// A meta event payload too short for its type.
    #[error("Meta event {kind:#04X} has a payload of {len} bytes")]
    MetaLength {
        /// The meta sub-type
        kind: u8,
        /// The declared payload length
        len: usize,
    },
    /// An invalid SMPTE offset
    #[error("{0}")]
    Smpte(#[from] SmpteError),
    /// The underlying file could not be read.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Create a reader error from a position and kind
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }

    /// Create a new out of bounds error
    pub const fn oob(position: usize) -> Self {
        Self::new(position, ReaderErrorKind::OutOfBounds)
    }

    /// Create a new end of track signal
    pub const fn end_of_track(position: usize) -> Self {
        Self::new(position, ReaderErrorKind::EndOfTrack)
    }

    /// Report a failure to read the header chunk as an invalid header.
    pub(crate) fn into_header_error(self) -> Self {
        let kind = match self.kind {
            ReaderErrorKind::OutOfBounds => HeaderError::Truncated.into(),
            #[cfg(feature = "std")]
            ReaderErrorKind::Io(e) => HeaderError::Unreadable(e.kind()).into(),
            kind => kind,
        };
        Self::new(self.position, kind)
    }

    /// True if out of bounds or unexpected end of file
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }

    /// True if this is the normal end of a track rather than a failure
    pub const fn is_end_of_track(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::EndOfTrack)
    }

    /// True if the file could not be recognized as a MIDI file
    pub const fn is_invalid_header(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::InvalidHeader(_))
    }

    /// Returns the error kind of the reader.
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }

    /// Returns the position where the read error occurred.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// The Read Result type (see [`ReaderError`])
pub type ReadResult<T> = Result<T, ReaderError>;
