use core::fmt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[doc = r#"
One of the sixteen MIDI channels

On the wire a channel is the low nibble of a status byte (0-15). People count
channels from 1, so [`Channel::number`] and [`Channel::from_number`] use 1-16.

# Example
```rust
# use midifile::prelude::*;
let channel = Channel::from_number(10).unwrap();
assert_eq!(channel, Channel::Ten);
assert_eq!(u8::from(channel), 9);
assert_eq!(Channel::from_status(0x99), Channel::Ten);
assert!(Channel::from_number(17).is_none());
```
"#]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    IntoPrimitive,
    TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Channel {
    /// 0bxxxx0000
    #[default]
    One = 0,
    /// 0bxxxx0001
    Two,
    /// 0bxxxx0010
    Three,
    /// 0bxxxx0011
    Four,
    /// 0bxxxx0100
    Five,
    /// 0bxxxx0101
    Six,
    /// 0bxxxx0110
    Seven,
    /// 0bxxxx0111
    Eight,
    /// 0bxxxx1000
    Nine,
    /// 0bxxxx1001
    Ten,
    /// 0bxxxx1010
    Eleven,
    /// 0bxxxx1011
    Twelve,
    /// 0bxxxx1100
    Thirteen,
    /// 0bxxxx1101
    Fourteen,
    /// 0bxxxx1110
    Fifteen,
    /// 0bxxxx1111
    Sixteen,
}

impl Channel {
    /// The channel carried in the low nibble of a status byte
    pub fn from_status(status: u8) -> Self {
        match Self::try_from(status & 0x0F) {
            Ok(channel) => channel,
            // every nibble value has a variant
            Err(_) => Self::One,
        }
    }

    /// Look up a channel by its 1-16 number
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1..=16 => Self::try_from(number - 1).ok(),
            _ => None,
        }
    }

    /// The 1-16 channel number
    pub fn number(self) -> u8 {
        u8::from(self) + 1
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[test]
fn channel_numbers() {
    use alloc::string::ToString;
    use pretty_assertions::assert_eq;
    assert_eq!(Channel::from_number(1), Some(Channel::One));
    assert_eq!(Channel::from_number(16), Some(Channel::Sixteen));
    assert_eq!(Channel::from_number(0), None);
    assert_eq!(Channel::Sixteen.number(), 16);
    assert_eq!(Channel::from_status(0x8F), Channel::Sixteen);
    assert_eq!(Channel::Three.to_string(), "3");
}
