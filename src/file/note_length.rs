#[doc = r#"
A note or rest duration

Named lengths are relative to the document's pulses per quarter note, so a
[`NoteLength::Crochet`] is always exactly one quarter note whatever the resolution.
[`NoteLength::Ticks`] is taken literally.

# Example
```rust
# use midifile::prelude::*;
assert_eq!(NoteLength::Crochet.ticks(384), 384);
assert_eq!(NoteLength::DottedQuaver.ticks(384), 288);
assert_eq!(NoteLength::TripletCrochet.ticks(384), 256);
assert_eq!(NoteLength::Ticks(17).ticks(384), 17);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteLength {
    /// Eight quarter notes
    Breve,
    /// Four quarter notes
    Semibreve,
    /// Two quarter notes
    Minim,
    /// One quarter note
    Crochet,
    /// An eighth note
    Quaver,
    /// A sixteenth note
    Semiquaver,
    /// A thirty-second note
    Semidemiquaver,
    /// Three quarter notes
    DottedMinim,
    /// A quarter note and a half
    DottedCrochet,
    /// Three sixteenths
    DottedQuaver,
    /// Three thirty-seconds
    DottedSemiquaver,
    /// Three sixty-fourths
    DottedSemidemiquaver,
    /// Two thirds of a quarter note
    TripletCrochet,
    /// An exact number of ticks
    Ticks(u32),
}

impl NoteLength {
    /// The length in ticks at the given resolution
    pub const fn ticks(self, ppqn: u16) -> u32 {
        let q = ppqn as u32;
        match self {
            Self::Breve => q * 8,
            Self::Semibreve => q * 4,
            Self::Minim => q * 2,
            Self::Crochet => q,
            Self::Quaver => q / 2,
            Self::Semiquaver => q / 4,
            Self::Semidemiquaver => q / 8,
            Self::DottedMinim => q * 3,
            Self::DottedCrochet => q * 3 / 2,
            Self::DottedQuaver => q * 3 / 4,
            Self::DottedSemiquaver => q * 3 / 8,
            Self::DottedSemidemiquaver => q * 3 / 16,
            Self::TripletCrochet => q * 2 / 3,
            Self::Ticks(ticks) => ticks,
        }
    }
}

impl From<u32> for NoteLength {
    fn from(ticks: u32) -> Self {
        Self::Ticks(ticks)
    }
}

#[test]
fn lengths_scale_with_resolution() {
    use pretty_assertions::assert_eq;
    assert_eq!(NoteLength::Semibreve.ticks(96), 384);
    assert_eq!(NoteLength::Minim.ticks(480), 960);
    assert_eq!(NoteLength::Semidemiquaver.ticks(480), 60);
    assert_eq!(NoteLength::DottedMinim.ticks(480), 1440);
    assert_eq!(NoteLength::DottedCrochet.ticks(480), 720);
    assert_eq!(NoteLength::TripletCrochet.ticks(480), 320);
    assert_eq!(NoteLength::from(5).ticks(480), 5);
}
