#![doc = r#"
Positional access to the bytes of a MIDI file

A [`MidiReader`](crate::reader::MidiReader) owns exactly one [`ByteSource`]. Every
track cursor reads through it by absolute offset, so any number of readers can be
open at once without sharing state.
"#]

#[cfg(feature = "std")]
mod file;
#[cfg(feature = "std")]
pub use file::*;

use crate::reader::{ReadResult, ReaderError};
use alloc::borrow::Cow;

/// Random-access, read-only bytes.
///
/// Multi-byte fields are big-endian, as they are in the file.
pub trait ByteSource {
    /// Total number of readable bytes.
    fn len(&self) -> usize;

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Fails with an out-of-bounds error if the range runs past [`ByteSource::len`].
    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> ReadResult<()>;

    /// True if there are no bytes at all.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one byte.
    fn read_u8(&mut self, offset: usize) -> ReadResult<u8> {
        let mut buf = [0u8; 1];
        self.read_at(offset, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a big-endian `u16`.
    fn read_u16(&mut self, offset: usize) -> ReadResult<u16> {
        let mut buf = [0u8; 2];
        self.read_at(offset, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    /// Read a big-endian `u32`.
    fn read_u32(&mut self, offset: usize) -> ReadResult<u32> {
        let mut buf = [0u8; 4];
        self.read_at(offset, &mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }
}

pub(crate) fn check_range(offset: usize, len: usize, total: usize) -> ReadResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= total => Ok(()),
        _ => Err(ReaderError::oob(offset)),
    }
}

/// An in-memory byte block, borrowed or owned.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    inner: Cow<'a, [u8]>,
}

impl<'a> SliceSource<'a> {
    /// Wrap some bytes
    pub fn new<B>(bytes: B) -> Self
    where
        B: Into<Cow<'a, [u8]>>,
    {
        Self {
            inner: bytes.into(),
        }
    }

    /// The full underlying buffer
    pub fn bytes(&self) -> &[u8] {
        &self.inner
    }
}

impl ByteSource for SliceSource<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> ReadResult<()> {
        check_range(offset, buf.len(), self.inner.len())?;
        buf.copy_from_slice(&self.inner[offset..offset + buf.len()]);
        Ok(())
    }
}

#[test]
fn slice_source_reads_big_endian_fields() {
    use pretty_assertions::assert_eq;
    let mut source = SliceSource::new(&[0x4D, 0x54, 0x00, 0x06, 0x01, 0xE0][..]);
    assert_eq!(source.read_u8(0).unwrap(), 0x4D);
    assert_eq!(source.read_u16(4).unwrap(), 480);
    assert_eq!(source.read_u32(2).unwrap(), 0x0006_01E0);
}

#[test]
fn slice_source_rejects_reads_past_the_end() {
    let mut source = SliceSource::new(&[0x00, 0x01, 0x02][..]);
    let err = source.read_u32(0).unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(err.position(), 0);
    assert!(source.read_u8(3).unwrap_err().is_out_of_bounds());
    assert!(source.read_u8(usize::MAX).unwrap_err().is_out_of_bounds());
}
