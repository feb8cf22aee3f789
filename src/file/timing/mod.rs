mod smpte;
pub use smpte::*;

use super::HeaderError;

/// The header timing type.
///
/// This is either the number of ticks per quarter note or
/// the alternative SMPTE format, chosen by the top bit of the division field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timing {
    /// Delta times count fractions of a quarter note
    TicksPerQuarterNote(u16),

    /// Delta times count fractions of an SMPTE frame
    Smpte {
        /// Frame rate
        fps: SmpteFps,
        /// Ticks per frame
        ticks_per_frame: u8,
    },
}

impl Timing {
    /// The tickrate per quarter note defines what a "quarter note" means.
    ///
    /// The leading bit of the u16 is disregarded, so 1-32767
    pub const fn new_ticks_per_quarter_note(tpqn: u16) -> Self {
        Self::TicksPerQuarterNote(tpqn & 0x7FFF)
    }

    /// Define the timing in terms of fps and ticks per frame
    pub const fn new_smpte(fps: SmpteFps, ticks_per_frame: u8) -> Self {
        Self::Smpte {
            fps,
            ticks_per_frame,
        }
    }

    /// Interpret the 16-bit division field of the header.
    pub const fn from_division(division: u16) -> Result<Self, HeaderError> {
        if division & 0x8000 == 0 {
            return Ok(Self::TicksPerQuarterNote(division));
        }
        let [high, low] = division.to_be_bytes();
        match SmpteFps::from_division_byte(high as i8) {
            Some(fps) => Ok(Self::new_smpte(fps, low)),
            None => Err(HeaderError::SmpteDivision(high as i8)),
        }
    }

    /// The 16-bit division field for the header.
    pub const fn division(&self) -> u16 {
        match self {
            Self::TicksPerQuarterNote(tpqn) => *tpqn & 0x7FFF,
            Self::Smpte {
                fps,
                ticks_per_frame,
            } => u16::from_be_bytes([fps.division_byte() as u8, *ticks_per_frame]),
        }
    }

    /// Returns Some if the midi timing is defined
    /// as ticks per quarter note
    pub const fn ticks_per_quarter_note(&self) -> Option<u16> {
        match self {
            Self::TicksPerQuarterNote(t) => Some(*t),
            _ => None,
        }
    }

    /// Length of one tick in microseconds, given the current tempo.
    ///
    /// SMPTE divisions ignore the tempo.
    pub fn micros_per_tick(&self, micros_per_quarter_note: u32) -> f64 {
        match self {
            Self::TicksPerQuarterNote(tpqn) => {
                micros_per_quarter_note as f64 / (*tpqn).max(1) as f64
            }
            Self::Smpte {
                fps,
                ticks_per_frame,
            } => {
                let ticks_per_second = fps.as_division() as u32 * (*ticks_per_frame).max(1) as u32;
                1_000_000. / ticks_per_second as f64
            }
        }
    }
    /// Length of `ticks` in microseconds, given the current tempo.
    ///
    /// Multiplies before dividing, so whole beats come out exact.
    pub fn micros_for_ticks(&self, ticks: u32, micros_per_quarter_note: u32) -> f64 {
        match self {
            Self::TicksPerQuarterNote(tpqn) => {
                ticks as f64 * micros_per_quarter_note as f64 / (*tpqn).max(1) as f64
            }
            Self::Smpte {
                fps,
                ticks_per_frame,
            } => {
                let ticks_per_second = fps.as_division() as u32 * (*ticks_per_frame).max(1) as u32;
                ticks as f64 * 1_000_000. / ticks_per_second as f64
            }
        }
    }
}

#[test]
fn division_parsing() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        Timing::from_division(0x0180),
        Ok(Timing::TicksPerQuarterNote(384))
    );
    assert_eq!(
        Timing::from_division(0xE728),
        Ok(Timing::new_smpte(SmpteFps::TwentyFive, 40))
    );
    assert_eq!(
        Timing::from_division(0xE828),
        Ok(Timing::new_smpte(SmpteFps::TwentyFour, 40))
    );
    assert_eq!(
        Timing::from_division(0xF000),
        Err(HeaderError::SmpteDivision(-16))
    );
    assert_eq!(Timing::new_smpte(SmpteFps::Thirty, 80).division(), 0xE250);
}

#[test]
fn tick_length() {
    use pretty_assertions::assert_eq;
    let tpqn = Timing::new_ticks_per_quarter_note(480);
    assert_eq!(tpqn.micros_per_tick(500_000) as u32, 1041);
    let smpte = Timing::new_smpte(SmpteFps::Thirty, 40);
    assert_eq!(smpte.micros_per_tick(500_000) as u32, 833);
}
