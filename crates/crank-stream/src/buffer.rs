//! Fixed-capacity buffers for pump output.

use crank_core::{Error, Result};

/// A byte region of fixed capacity with a write cursor.
///
/// Storage is reserved once and never reallocated. Every write that would
/// land past the capacity is reported instead of truncated.
#[derive(Debug)]
pub struct FixedBuffer {
    /// Internal buffer storage, always `capacity` bytes long.
    data: Vec<u8>,
    /// End of valid data.
    used: usize,
}

impl FixedBuffer {
    /// Allocate a zero-filled buffer of exactly `capacity` bytes.
    ///
    /// Allocation failure is reported as [`Error::AllocationFailed`].
    pub fn allocate(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailed {
                requested_bytes: capacity,
            })?;
        data.resize(capacity, 0);

        Ok(Self { data, used: 0 })
    }

    /// Get the buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the number of valid bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.used
    }

    /// Check if buffer holds no valid bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Get the number of bytes that can still be written.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// Check if buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.used >= self.data.len()
    }

    /// Copy `bytes` into the buffer at `offset`.
    ///
    /// Fails without writing anything if the bytes would not fit.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let capacity = self.capacity();
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= capacity)
            .ok_or_else(|| Error::buffer_overflow(offset, bytes.len(), capacity))?;

        self.data[offset..end].copy_from_slice(bytes);
        self.used = self.used.max(end);
        Ok(())
    }

    /// Get the unused tail for a producer to fill.
    ///
    /// Follow with [`commit`](Self::commit) to mark the bytes valid.
    #[inline]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.used..]
    }

    /// Mark `n` more bytes after the cursor as valid.
    pub fn commit(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::buffer_overflow(self.used, n, self.capacity()));
        }
        self.used += n;
        Ok(())
    }

    /// Reset the cursor. Capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.used = 0;
    }

    /// Get a slice of the valid data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Get mutable access to the valid data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.used]
    }
}

/// Output buffer sizing: `n + n/2 + margin`.
///
/// The margin covers worst-case expansion plus encoder framing for the
/// codecs this crate targets. A codec that expands further needs a larger
/// margin, not a growing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizing {
    /// Bytes added on top of `n + n/2`.
    pub margin: usize,
}

impl BufferSizing {
    /// Create sizing with an explicit margin.
    pub fn with_margin(margin: usize) -> Self {
        Self { margin }
    }

    /// Capacity for a run over `input_len` bytes.
    pub fn capacity_for(&self, input_len: usize) -> usize {
        input_len
            .saturating_add(input_len / 2)
            .saturating_add(self.margin)
    }

    /// Allocate a buffer sized for `input_len` bytes.
    pub fn allocate_for(&self, input_len: usize) -> Result<FixedBuffer> {
        FixedBuffer::allocate(self.capacity_for(input_len))
    }
}

impl Default for BufferSizing {
    fn default() -> Self {
        Self::with_margin(crate::DEFAULT_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate() {
        let buf = FixedBuffer::allocate(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.remaining(), 16);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let err = FixedBuffer::allocate(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailed {
                requested_bytes: usize::MAX
            }
        ));
    }

    #[test]
    fn test_write_at() {
        let mut buf = FixedBuffer::allocate(8).unwrap();

        buf.write_at(0, b"Hello").unwrap();
        assert_eq!(buf.as_slice(), b"Hello");

        // Overwrite inside the valid region keeps the cursor
        buf.write_at(1, b"ELL").unwrap();
        assert_eq!(buf.as_slice(), b"HELLo");

        buf.write_at(5, b"!!!").unwrap();
        assert!(buf.is_full());
    }

    #[test]
    fn test_write_past_capacity() {
        let mut buf = FixedBuffer::allocate(8).unwrap();
        buf.write_at(0, b"1234").unwrap();

        let err = buf.write_at(6, b"abc").unwrap_err();
        assert!(matches!(
            err,
            Error::BufferOverflow {
                offset: 6,
                len: 3,
                capacity: 8
            }
        ));
        // Nothing written
        assert_eq!(buf.as_slice(), b"1234");

        assert!(buf.write_at(usize::MAX, b"x").is_err());
    }

    #[test]
    fn test_spare_and_commit() {
        let mut buf = FixedBuffer::allocate(6).unwrap();

        buf.spare_mut()[..4].copy_from_slice(b"abcd");
        buf.commit(4).unwrap();
        assert_eq!(buf.as_slice(), b"abcd");
        assert_eq!(buf.spare_mut().len(), 2);

        assert!(buf.commit(3).is_err());
        assert_eq!(buf.len(), 4);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 6);
    }

    #[test]
    fn test_sizing() {
        let sizing = BufferSizing::default();
        assert_eq!(sizing.capacity_for(4), 10);
        assert_eq!(sizing.capacity_for(32), 52);
        assert_eq!(sizing.capacity_for(128), 196);

        let wide = BufferSizing::with_margin(64);
        assert_eq!(wide.capacity_for(0), 64);
        assert_eq!(wide.allocate_for(10).unwrap().capacity(), 79);
    }
}
