use super::WriteResult;
use crate::vlq;
use alloc::vec::Vec;

/// Bytes a track buffer grows by
pub const GROWTH_INCREMENT: usize = 8192;

/// Bytes kept free for the delta-time and header of one message
pub const MESSAGE_BUDGET: usize = 32;

#[doc = r#"
The encoded events of one track

Capacity is added in whole [`GROWTH_INCREMENT`] steps, always leaving room for
[`MESSAGE_BUDGET`] bytes beyond the payload about to be written. Growing never
disturbs the bytes already written; if memory cannot be found the buffer is
left as it was.
"#]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackBuffer {
    bytes: Vec<u8>,
}

impl TrackBuffer {
    /// An empty buffer that has not allocated
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Make sure `payload` more bytes, plus the message budget, fit without reallocating.
    pub fn reserve(&mut self, payload: usize) -> WriteResult<()> {
        let needed = self
            .bytes
            .len()
            .saturating_add(payload)
            .saturating_add(MESSAGE_BUDGET);
        let capacity = self.bytes.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let len = self.bytes.len();
        let additional = (needed - capacity)
            .div_ceil(GROWTH_INCREMENT)
            .checked_mul(GROWTH_INCREMENT)
            .and_then(|grow| grow.checked_add(capacity))
            .map_or(needed - len, |total| total - len);
        self.bytes.try_reserve_exact(additional)?;
        Ok(())
    }

    /// Append a delta-time.
    pub(crate) fn push_delta(&mut self, delta: u32) {
        vlq::write(delta, &mut self.bytes);
    }

    /// Append raw bytes.
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Bytes written
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes that can be held before growing again
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// The encoded events
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

#[test]
fn grows_in_whole_increments() {
    use pretty_assertions::assert_eq;
    let mut buffer = TrackBuffer::new();
    assert_eq!(buffer.capacity(), 0);

    buffer.reserve(3).unwrap();
    assert!(buffer.capacity() >= GROWTH_INCREMENT);
    let first = buffer.capacity();
    buffer.push(&[0x90, 0x3C, 0x64]);

    // still fits, nothing moves
    buffer.reserve(100).unwrap();
    assert_eq!(buffer.capacity(), first);

    buffer.reserve(GROWTH_INCREMENT * 2).unwrap();
    assert!(buffer.capacity() >= 3 + GROWTH_INCREMENT * 2 + MESSAGE_BUDGET);
    assert_eq!(buffer.as_slice(), &[0x90, 0x3C, 0x64]);
}

#[test]
fn impossible_growth_leaves_contents_alone() {
    use pretty_assertions::assert_eq;
    let mut buffer = TrackBuffer::new();
    buffer.reserve(4).unwrap();
    buffer.push_delta(0x80);
    buffer.push(&[0xFF, 0x2F, 0x00]);

    let err = buffer.reserve(usize::MAX / 2).unwrap_err();
    assert!(matches!(err, super::WriterError::AllocationFailure(_)));
    assert_eq!(buffer.as_slice(), &[0x81, 0x00, 0xFF, 0x2F, 0x00]);
}
