#![doc = r#"
Variable-length quantities

Delta-times and the lengths of meta and system-exclusive payloads are stored as
big-endian groups of seven bits. Every byte but the last has its high bit set.

```text
0x00000000  ->  00
0x00000040  ->  40
0x00000080  ->  81 00
0x00003FFF  ->  FF 7F
0x0FFFFFFF  ->  FF FF FF 7F
```

The file format caps delta-times at 28 bits (four bytes). Encoding accepts any
`u32`, so a fifth byte appears above `0x0FFFFFFF`, and decoding accepts the same
five-byte forms back.
"#]

use alloc::vec::Vec;
use thiserror::Error;

/// The longest encoding produced for a `u32`.
pub const MAX_LEN: usize = 5;

/// Largest value that fits in the four bytes the file format allows.
pub const MAX_SMF_VALUE: u32 = 0x0FFF_FFFF;

/// Failures while decoding a variable-length quantity
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VlqError {
    /// Every available byte had its continuation bit set.
    #[error("Variable-length quantity is not terminated")]
    Unterminated,
    /// The decoded value does not fit in a `u32`.
    #[error("Variable-length quantity overflows 32 bits")]
    Overflow,
}

/// An encoded variable-length quantity, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vlq {
    bytes: [u8; MAX_LEN],
    len: u8,
}

impl Vlq {
    /// The encoded bytes, most significant group first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Number of bytes in the encoding (1 to 5).
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Always false; zero still takes one byte.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Encode `value` into its variable-length form.
pub const fn encode(value: u32) -> Vlq {
    // gather 7-bit groups least significant first, then reverse into place
    let mut groups = [0u8; MAX_LEN];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }

    let mut bytes = [0u8; MAX_LEN];
    let mut i = 0;
    while i < count {
        let group = groups[count - 1 - i];
        bytes[i] = if i + 1 < count { group | 0x80 } else { group };
        i += 1;
    }
    Vlq {
        bytes,
        len: count as u8,
    }
}

/// Append the encoding of `value` to `out`.
pub fn write(value: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(encode(value).as_bytes());
}

/// Decode a variable-length quantity from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed. Reading stops at the
/// first byte with a clear high bit; running out of bytes before that is
/// [`VlqError::Unterminated`].
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), VlqError> {
    let mut value: u32 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(VlqError::Overflow);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(VlqError::Unterminated)
}

#[test]
fn encode_known_values() {
    use pretty_assertions::assert_eq;
    assert_eq!(encode(0).as_bytes(), &[0x00]);
    assert_eq!(encode(0x40).as_bytes(), &[0x40]);
    assert_eq!(encode(0x7F).as_bytes(), &[0x7F]);
    assert_eq!(encode(0x80).as_bytes(), &[0x81, 0x00]);
    assert_eq!(encode(0x2000).as_bytes(), &[0xC0, 0x00]);
    assert_eq!(encode(0x3FFF).as_bytes(), &[0xFF, 0x7F]);
    assert_eq!(encode(0x4000).as_bytes(), &[0x81, 0x80, 0x00]);
    assert_eq!(encode(0x0FFF_FFFF).as_bytes(), &[0xFF, 0xFF, 0xFF, 0x7F]);
    assert_eq!(encode(u32::MAX).as_bytes(), &[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
}

#[test]
fn decode_known_values() {
    use pretty_assertions::assert_eq;
    assert_eq!(decode(&[0x00]), Ok((0, 1)));
    assert_eq!(decode(&[0x81, 0x00, 0x55]), Ok((0x80, 2)));
    assert_eq!(decode(&[0xC0, 0x00]), Ok((0x2000, 2)));
    assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0x7F]), Ok((0x0FFF_FFFF, 4)));
    assert_eq!(decode(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]), Ok((u32::MAX, 5)));
}

#[test]
fn decode_rejects_bad_input() {
    use pretty_assertions::assert_eq;
    assert_eq!(decode(&[]), Err(VlqError::Unterminated));
    assert_eq!(decode(&[0x81, 0x80]), Err(VlqError::Unterminated));
    assert_eq!(
        decode(&[0x90, 0x80, 0x80, 0x80, 0x00]),
        Err(VlqError::Overflow)
    );
}

#[test]
fn smf_range_roundtrips_within_four_bytes() {
    use pretty_assertions::assert_eq;
    let mut value: u32 = 0;
    while value <= MAX_SMF_VALUE {
        let encoded = encode(value);
        assert!(encoded.len() <= 4, "{value:#x} took {} bytes", encoded.len());
        assert_eq!(decode(encoded.as_bytes()), Ok((value, encoded.len())));
        value = value * 3 + 1;
    }
    let edges = [0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, MAX_SMF_VALUE];
    for value in edges {
        let encoded = encode(value);
        assert_eq!(decode(encoded.as_bytes()), Ok((value, encoded.len())));
    }
}
