#[doc = r#"
A time signature

The denominator is stored in the file as a power of two: `2` means quarter notes,
`3` eighth notes. [`TimeSignature::denominator`] gives the musical value and
[`TimeSignature::denominator_ticks`] the length of one denominator beat, which is
the whole-note length divided by that power of two.

Some writers compute the byte by dividing a fixed note length by the musical
denominator instead of taking its log2. Their bytes match these for `/2` and `/4`
only, so a `6/8` from such a writer reads back with a different denominator.

# Example
```rust
# use midifile::prelude::*;
let six_eight = TimeSignature::new(6, 8).unwrap();
assert_eq!(six_eight.to_bytes(), [6, 3, 24, 8]);
assert_eq!(six_eight.denominator_ticks(384), 192);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Log2 of the beat unit
    pub denominator_power: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note (24 clocks)
    pub notated_32nds: u8,
}

impl TimeSignature {
    /// A signature with the usual metronome settings (24 clocks, 8 32nds).
    ///
    /// `None` unless `numerator` is non-zero and `denominator` a power of two.
    pub const fn new(numerator: u8, denominator: u8) -> Option<Self> {
        if numerator == 0 || !denominator.is_power_of_two() {
            return None;
        }
        Some(Self {
            numerator,
            denominator_power: denominator.trailing_zeros() as u8,
            clocks_per_click: 24,
            notated_32nds: 8,
        })
    }

    /// Replace the metronome settings.
    pub const fn with_metronome(mut self, clocks_per_click: u8, notated_32nds: u8) -> Self {
        self.clocks_per_click = clocks_per_click;
        self.notated_32nds = notated_32nds;
        self
    }

    /// Read the payload. Missing metronome bytes take their usual values.
    ///
    /// `None` if the payload holds fewer than two bytes.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let (&numerator, rest) = data.split_first()?;
        let (&denominator_power, rest) = rest.split_first()?;
        Some(Self {
            numerator,
            denominator_power,
            clocks_per_click: rest.first().copied().unwrap_or(24),
            notated_32nds: rest.get(1).copied().unwrap_or(8),
        })
    }

    /// The 4-byte payload.
    pub const fn to_bytes(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator_power,
            self.clocks_per_click,
            self.notated_32nds,
        ]
    }

    /// The musical denominator (4 for quarter notes). 0 if it does not fit in a `u32`.
    pub const fn denominator(&self) -> u32 {
        match 1u32.checked_shl(self.denominator_power as u32) {
            Some(d) => d,
            None => 0,
        }
    }

    /// Ticks in one beat of the denominator's unit at the given resolution.
    pub const fn denominator_ticks(&self, ppqn: u16) -> u32 {
        let whole_note = ppqn as u32 * 4;
        match whole_note.checked_shr(self.denominator_power as u32) {
            Some(ticks) => ticks,
            None => 0,
        }
    }
}

#[doc = r#"
A key signature

`key` counts sharps when positive and flats when negative, from -7 to 7. The file
stores it as a signed byte, so 0xFD is three flats.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySignature {
    /// Sharps (positive) or flats (negative)
    pub key: i8,
    /// Minor rather than major
    pub minor: bool,
}

impl KeySignature {
    /// `None` if `key` is outside -7..=7.
    pub const fn new(key: i8, minor: bool) -> Option<Self> {
        if key < -7 || key > 7 {
            return None;
        }
        Some(Self { key, minor })
    }

    /// Read the two payload bytes.
    pub const fn from_bytes(sf: u8, mi: u8) -> Self {
        let key = if sf & 0x80 != 0 {
            -(256 - sf as i16)
        } else {
            sf as i16
        };
        Self {
            key: key as i8,
            minor: mi != 0,
        }
    }

    /// The two payload bytes.
    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.key as u8, self.minor as u8]
    }

    /// Number of sharps, 0 for flat keys.
    pub const fn sharps(&self) -> u8 {
        if self.key > 0 { self.key as u8 } else { 0 }
    }

    /// Number of flats, 0 for sharp keys.
    pub const fn flats(&self) -> u8 {
        if self.key < 0 {
            self.key.unsigned_abs()
        } else {
            0
        }
    }
}

#[test]
fn time_signature_bytes() {
    use pretty_assertions::assert_eq;
    let four_four = TimeSignature::new(4, 4).unwrap();
    assert_eq!(four_four.to_bytes(), [4, 2, 24, 8]);
    assert_eq!(four_four.denominator(), 4);
    assert_eq!(four_four.denominator_ticks(480), 480);

    let two_two = TimeSignature::new(2, 2).unwrap().with_metronome(48, 8);
    assert_eq!(two_two.to_bytes(), [2, 1, 48, 8]);
    assert_eq!(two_two.denominator_ticks(384), 768);

    assert_eq!(TimeSignature::new(3, 6), None);
    assert_eq!(TimeSignature::new(0, 4), None);
    assert_eq!(
        TimeSignature::from_bytes(&[7, 3]),
        Some(TimeSignature::new(7, 8).unwrap())
    );
    assert_eq!(TimeSignature::from_bytes(&[7]), None);
}

#[test]
fn key_signature_sign_extension() {
    use pretty_assertions::assert_eq;
    assert_eq!(KeySignature::from_bytes(0xFD, 0), KeySignature::new(-3, false).unwrap());
    assert_eq!(KeySignature::from_bytes(0x02, 1), KeySignature::new(2, true).unwrap());
    assert_eq!(KeySignature::from_bytes(0xF9, 1).flats(), 7);
    assert_eq!(KeySignature::new(-3, false).unwrap().to_bytes(), [0xFD, 0]);
    assert_eq!(KeySignature::new(5, false).unwrap().sharps(), 5);
    assert_eq!(KeySignature::new(8, false), None);
}
