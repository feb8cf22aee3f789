#![doc = r#"
SMPTE Offset - the starting time of a track

The payload is five bytes:

```text
0rrhhhhh  minutes  seconds  frames  subframes
```

where `rr` selects the frame rate (24, 25, 29.97 or 30 fps) and `hhhhh` holds the
hour. Subframes are hundredths of a frame.
"#]

use crate::file::SmpteFps;
use thiserror::Error;

/// Invalid SMPTE offset fields
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SmpteError {
    /// The payload is not five bytes.
    #[error("SMPTE offset payload must be 5 bytes, got {0}")]
    Length(usize),
    /// The frame-rate bits hold something other than 0-3.
    #[error("Invalid SMPTE frame rate bits {0}")]
    TrackFrame(u8),
    /// Hour above 23
    #[error("Invalid SMPTE hour {0}")]
    HourOffset(u8),
    /// Minute above 59
    #[error("Invalid SMPTE minute {0}")]
    MinuteOffset(u8),
    /// Second above 59
    #[error("Invalid SMPTE second {0}")]
    SecondOffset(u8),
    /// Frame not below the frame rate
    #[error("Invalid SMPTE frame {0}")]
    Frame(u8),
    /// Subframe above 99
    #[error("Invalid SMPTE subframe {0}")]
    Subframe(u8),
}

/// A track's starting position in SMPTE time code.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    /// The frame rate for this offset.
    pub fps: SmpteFps,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
    /// Frame within the second, below the nominal frame rate
    pub frame: u8,
    /// Hundredths of a frame, 0-99
    pub subframe: u8,
}

impl SmpteOffset {
    /// Create an offset, checking every field.
    pub const fn new(
        fps: SmpteFps,
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        subframe: u8,
    ) -> Result<Self, SmpteError> {
        let offset = Self {
            fps,
            hour,
            minute,
            second,
            frame,
            subframe,
        };
        match offset.validate() {
            Ok(()) => Ok(offset),
            Err(e) => Err(e),
        }
    }

    /// Check every field against its range.
    pub const fn validate(&self) -> Result<(), SmpteError> {
        if self.hour > 23 {
            return Err(SmpteError::HourOffset(self.hour));
        }
        if self.minute > 59 {
            return Err(SmpteError::MinuteOffset(self.minute));
        }
        if self.second > 59 {
            return Err(SmpteError::SecondOffset(self.second));
        }
        if self.frame >= self.fps.as_division() {
            return Err(SmpteError::Frame(self.frame));
        }
        if self.subframe > 99 {
            return Err(SmpteError::Subframe(self.subframe));
        }
        Ok(())
    }

    /// Convert this offset to microseconds using its own frame rate.
    pub const fn as_micros(&self) -> f64 {
        self.as_micros_with_override(self.fps)
    }

    /// Convert this offset to microseconds, counting frames at `fps` instead.
    ///
    /// Used when the file's division specifies a different rate than the offset.
    pub const fn as_micros_with_override(&self, fps: SmpteFps) -> f64 {
        let whole_seconds =
            (self.hour as u64 * 3600) + (self.minute as u64) * 60 + self.second as u64;
        (whole_seconds * 1_000_000) as f64
            + ((self.frame as u64) * 1_000_000) as f64 / fps.as_f64()
            + ((self.subframe as u32) * 10_000) as f64 / fps.as_f64()
    }

    /// Parse the 5-byte payload.
    pub const fn parse(data: &[u8]) -> Result<Self, SmpteError> {
        if data.len() != 5 {
            return Err(SmpteError::Length(data.len()));
        }
        // 0 rr hhhhh
        let bits = data[0] >> 5;
        let fps = match SmpteFps::from_offset_bits(bits) {
            Some(fps) => fps,
            None => return Err(SmpteError::TrackFrame(bits)),
        };
        Self::new(
            fps,
            data[0] & 0b0001_1111,
            data[1],
            data[2],
            data[3],
            data[4],
        )
    }

    /// The 5-byte payload.
    pub const fn to_bytes(&self) -> [u8; 5] {
        [
            (self.fps.offset_bits() << 5) | (self.hour & 0b0001_1111),
            self.minute,
            self.second,
            self.frame,
            self.subframe,
        ]
    }
}

#[test]
fn parse_smpte_offset() {
    use pretty_assertions::assert_eq;
    // this are the bytes after 00 FF 54 05
    let bytes = [0x41, 0x17, 0x2D, 0x0C, 0x22];
    let offset = SmpteOffset::parse(&bytes).unwrap();

    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 1);
    assert_eq!(offset.minute, 23);
    assert_eq!(offset.second, 45);
    assert_eq!(offset.frame, 12);
    assert_eq!(offset.subframe, 34);
    assert_eq!(offset.to_bytes(), bytes);
}

#[test]
fn parse_invalid_smpte_offset() {
    use pretty_assertions::assert_eq;
    let bytes = [0x7F, 0x17, 0x2D, 0x0C, 0x22];
    assert_eq!(
        SmpteOffset::parse(&bytes).unwrap_err(),
        SmpteError::HourOffset(31)
    );

    let bytes = [0x41, 0x50, 0x2D, 0x0C, 0x22];
    assert_eq!(
        SmpteOffset::parse(&bytes).unwrap_err(),
        SmpteError::MinuteOffset(80)
    );

    // 24 fps has frames 0-23
    let bytes = [0x01, 0x00, 0x00, 24, 0x00];
    assert_eq!(SmpteOffset::parse(&bytes).unwrap_err(), SmpteError::Frame(24));
}

#[test]
fn offset_in_micros() {
    use pretty_assertions::assert_eq;
    let offset = SmpteOffset::new(SmpteFps::TwentyFive, 0, 1, 2, 5, 50).unwrap();
    // 62 seconds, 5.5 frames at 25 fps = 220ms
    assert_eq!(offset.as_micros() as u64, 62_220_000);
}
