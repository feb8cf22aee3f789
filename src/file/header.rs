use super::{CHUNK_PREFIX_LEN, HEADER_MAGIC, Timing};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Length of the header chunk's body. Always 6 when written.
pub const HEADER_LEN: u32 = 6;

/// Bytes taken by a written header chunk, prefix included.
pub const HEADER_CHUNK_LEN: usize = CHUNK_PREFIX_LEN + HEADER_LEN as usize;

/// Problems with the `MThd` chunk
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// The file does not start with `MThd`.
    #[error("Expected MThd, found {0:?}")]
    Magic([u8; 4]),
    /// The header body is shorter than the six bytes it must hold.
    #[error("Header length {0} is shorter than 6")]
    Length(u32),
    /// The format field is not 0, 1 or 2.
    #[error("Unknown file format {0}")]
    Format(u16),
    /// The division uses an SMPTE frame rate MIDI does not define.
    #[error("Invalid SMPTE frame rate in division: {0}")]
    SmpteDivision(i8),
    /// The source ends inside the header chunk.
    #[error("File ends inside the header chunk")]
    Truncated,
    /// The source could not be opened or read.
    #[cfg(feature = "std")]
    #[error("Unreadable source: {0}")]
    Unreadable(std::io::ErrorKind),
}

#[doc = r#"
How the tracks of a file relate to each other

```text
0: one track containing every channel
1: several tracks played at the same time
2: several independent single-track patterns
```
"#]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum FormatType {
    /// Format 0
    SingleMultiChannel = 0,
    /// Format 1
    #[default]
    Simultaneous = 1,
    /// Format 2
    SequentiallyIndependent = 2,
}

#[doc = r#"
The contents of the `MThd` chunk
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    format: FormatType,
    num_tracks: u16,
    timing: Timing,
}

impl Header {
    /// Create a new header
    pub const fn new(format: FormatType, num_tracks: u16, timing: Timing) -> Self {
        Self {
            format,
            num_tracks,
            timing,
        }
    }

    /// Parse the header chunk from the first 14 bytes of a file.
    ///
    /// Also returns the declared body length, which may exceed 6.
    pub fn parse(bytes: &[u8; HEADER_CHUNK_LEN]) -> Result<(Self, u32), HeaderError> {
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != HEADER_MAGIC {
            return Err(HeaderError::Magic(magic));
        }
        let len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if len < HEADER_LEN {
            return Err(HeaderError::Length(len));
        }
        let format = u16::from_be_bytes([bytes[8], bytes[9]]);
        let format = FormatType::try_from(format).map_err(|_| HeaderError::Format(format))?;
        let num_tracks = u16::from_be_bytes([bytes[10], bytes[11]]);
        let timing = Timing::from_division(u16::from_be_bytes([bytes[12], bytes[13]]))?;

        Ok((Self::new(format, num_tracks, timing), len))
    }

    /// Serialize as a complete header chunk.
    pub fn to_bytes(&self) -> [u8; HEADER_CHUNK_LEN] {
        let mut out = [0u8; HEADER_CHUNK_LEN];
        out[0..4].copy_from_slice(&HEADER_MAGIC);
        out[4..8].copy_from_slice(&HEADER_LEN.to_be_bytes());
        out[8..10].copy_from_slice(&u16::from(self.format).to_be_bytes());
        out[10..12].copy_from_slice(&self.num_tracks.to_be_bytes());
        out[12..14].copy_from_slice(&self.timing.division().to_be_bytes());
        out
    }

    /// The file format
    pub const fn format(&self) -> FormatType {
        self.format
    }

    /// Number of tracks the header declares
    pub const fn num_tracks(&self) -> u16 {
        self.num_tracks
    }

    /// Get the timing props
    pub const fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Pulses per quarter note, if the division is metrical
    pub const fn ppqn(&self) -> Option<u16> {
        self.timing.ticks_per_quarter_note()
    }
}

#[test]
fn header_bytes_roundtrip() {
    use pretty_assertions::assert_eq;
    let header = Header::new(
        FormatType::Simultaneous,
        2,
        Timing::new_ticks_per_quarter_note(480),
    );
    let bytes = header.to_bytes();
    assert_eq!(
        bytes,
        [
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0x01, 0xE0
        ]
    );
    assert_eq!(Header::parse(&bytes), Ok((header, 6)));
}

#[test]
fn header_rejects_bad_fields() {
    use pretty_assertions::assert_eq;
    let mut bytes = *b"MThd\0\0\0\x06\0\x01\0\x01\x01\x80";
    assert!(Header::parse(&bytes).is_ok());

    bytes[0] = b'R';
    assert_eq!(Header::parse(&bytes), Err(HeaderError::Magic(*b"RThd")));
    bytes[0] = b'M';

    bytes[7] = 5;
    assert_eq!(Header::parse(&bytes), Err(HeaderError::Length(5)));
    bytes[7] = 6;

    bytes[9] = 3;
    assert_eq!(Header::parse(&bytes), Err(HeaderError::Format(3)));
}
