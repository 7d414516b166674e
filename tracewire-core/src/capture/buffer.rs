//! Circular sample store
//!
//! Capacity is a power of two so every index folds into range with a
//! single AND against the wrap mask. No index leaves this module unmasked.
//!
//! The write cursor is only ever moved through a [`RingWriter`], which is
//! handed to the sampling data path. Readers see the cursor but cannot
//! move it.

/// Errors that can occur when building a capture buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Storage has zero length
    Empty,
    /// Storage length is not a power of two
    NotPowerOfTwo,
    /// Storage length does not match the transfer block geometry
    GeometryMismatch,
}

/// Fixed-capacity ring of 8-bit samples
pub struct CaptureBuffer<'a> {
    storage: &'a mut [u8],
    mask: usize,
    /// Index of the most recently deposited sample
    write: usize,
}

impl<'a> CaptureBuffer<'a> {
    /// Wrap `storage` as a ring
    ///
    /// The write cursor starts one slot before index 0, so the first
    /// deposited sample lands at index 0.
    pub fn new(storage: &'a mut [u8]) -> Result<Self, BufferError> {
        let len = storage.len();
        if len == 0 {
            return Err(BufferError::Empty);
        }
        if !len.is_power_of_two() {
            return Err(BufferError::NotPowerOfTwo);
        }
        Ok(Self {
            storage,
            mask: len - 1,
            write: len - 1,
        })
    }

    /// Number of samples the ring holds
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Wrap mask (`capacity - 1`)
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Fold any index into the valid range
    #[inline]
    pub fn wrap(&self, index: usize) -> usize {
        index & self.mask
    }

    /// Index of the most recently deposited sample
    pub fn write_cursor(&self) -> usize {
        self.write
    }

    /// Index the next deposited sample will occupy
    pub fn next_write_index(&self) -> usize {
        self.wrap(self.write.wrapping_add(1))
    }

    /// Sample at a physical index
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.storage[index & self.mask]
    }

    /// Sample `offset` positions before `from`, walking backward in time
    #[inline]
    pub fn back_from(&self, from: usize, offset: usize) -> u8 {
        self.storage[from.wrapping_sub(offset) & self.mask]
    }

    /// Hand the write side to the data path
    ///
    /// At most `limit` samples may be deposited through the returned writer.
    pub fn writer(&mut self, limit: usize) -> RingWriter<'_> {
        RingWriter {
            storage: &mut *self.storage,
            mask: self.mask,
            write: &mut self.write,
            limit,
            written: 0,
        }
    }

    /// Give the backing storage back
    pub fn into_storage(self) -> &'a mut [u8] {
        self.storage
    }
}

/// Write access to a [`CaptureBuffer`], owned by the sampling data path
pub struct RingWriter<'w> {
    storage: &'w mut [u8],
    mask: usize,
    write: &'w mut usize,
    limit: usize,
    written: usize,
}

impl RingWriter<'_> {
    /// Deposit one sample at the next write position
    ///
    /// Returns `false` once the writer's sample budget is used up.
    #[inline]
    pub fn push(&mut self, sample: u8) -> bool {
        if self.written >= self.limit {
            return false;
        }
        let index = (*self.write).wrapping_add(1) & self.mask;
        self.storage[index] = sample;
        *self.write = index;
        self.written += 1;
        true
    }

    /// Deposit as many samples from `samples` as the budget allows
    ///
    /// Returns the number of samples deposited.
    pub fn extend_from_slice(&mut self, samples: &[u8]) -> usize {
        let mut count = 0;
        for &sample in samples {
            if !self.push(sample) {
                break;
            }
            count += 1;
        }
        count
    }

    /// Advance the cursor over samples a transfer engine already stored
    ///
    /// Used by DMA-backed samplers whose hardware writes the memory directly.
    /// Returns the number of samples accepted.
    pub fn commit(&mut self, count: usize) -> usize {
        let count = count.min(self.remaining());
        *self.write = (*self.write).wrapping_add(count) & self.mask;
        self.written += count;
        count
    }

    /// Index the next sample will occupy
    pub fn next_index(&self) -> usize {
        (*self.write).wrapping_add(1) & self.mask
    }

    /// Samples still accepted by this writer
    pub fn remaining(&self) -> usize {
        self.limit - self.written
    }

    /// Samples deposited through this writer
    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_bad_capacity() {
        let mut empty: [u8; 0] = [];
        assert_eq!(
            CaptureBuffer::new(&mut empty).err(),
            Some(BufferError::Empty)
        );

        let mut odd = [0u8; 12];
        assert_eq!(
            CaptureBuffer::new(&mut odd).err(),
            Some(BufferError::NotPowerOfTwo)
        );
    }

    #[test]
    fn test_first_sample_lands_at_zero() {
        let mut storage = [0u8; 8];
        let mut ring = CaptureBuffer::new(&mut storage).unwrap();
        assert_eq!(ring.next_write_index(), 0);

        let mut writer = ring.writer(1);
        assert!(writer.push(0xA5));
        assert!(!writer.push(0x5A));

        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(ring.get(0), 0xA5);
    }

    #[test]
    fn test_writer_wraps() {
        let mut storage = [0u8; 4];
        let mut ring = CaptureBuffer::new(&mut storage).unwrap();

        let written = ring.writer(6).extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(written, 6);
        assert_eq!(ring.write_cursor(), 1);
        assert_eq!(ring.back_from(ring.write_cursor(), 0), 6);
        assert_eq!(ring.back_from(ring.write_cursor(), 1), 5);
        assert_eq!(ring.back_from(ring.write_cursor(), 3), 3);
    }

    #[test]
    fn test_commit_respects_budget() {
        let mut storage = [0u8; 16];
        let mut ring = CaptureBuffer::new(&mut storage).unwrap();

        let mut writer = ring.writer(10);
        assert_eq!(writer.commit(4), 4);
        assert_eq!(writer.commit(20), 6);
        assert_eq!(writer.remaining(), 0);

        assert_eq!(ring.write_cursor(), 9);
    }

    proptest! {
        #[test]
        fn prop_back_from_matches_physical_index(
            start in 0usize..256,
            count in 1usize..512,
            offset in 0usize..256,
        ) {
            let mut storage = [0u8; 256];
            let mut ring = CaptureBuffer::new(&mut storage).unwrap();

            // Move the cursor to an arbitrary starting point
            ring.writer(start).commit(start);
            let mut writer = ring.writer(count);
            for i in 0..count {
                writer.push(i as u8);
            }

            let w = ring.write_cursor();
            let expected = ring.get(w.wrapping_sub(offset) & 255);
            prop_assert_eq!(ring.back_from(w, offset), expected);
            prop_assert!(w < ring.capacity());
        }
    }
}
