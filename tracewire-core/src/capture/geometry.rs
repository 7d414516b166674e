//! Transfer block and sampling clock geometry
//!
//! The capture buffer is filled by a chain of equally sized transfer
//! blocks. When one block fills, the next is already queued, so sampling
//! never pauses at a block boundary and the last block chains back to the
//! first.
//!
//! The sampling clock is a PIO-style state machine clocked from the system
//! clock through a 16.8 fixed-point divider.

use super::buffer::BufferError;

/// Bytes moved by one chained transfer block
pub const DMA_BYTES_PER_CHUNK: usize = 32768;

/// Number of chained transfer blocks
pub const LA_DMA_COUNT: usize = 4;

/// Total capture capacity in samples (one byte per sample)
pub const CAPTURE_CAPACITY: usize = DMA_BYTES_PER_CHUNK * LA_DMA_COUNT;

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// State machine cycles spent per captured sample (`in pins, 8`)
pub const CYCLES_PER_SAMPLE: u32 = 1;

/// Layout of the chained transfer blocks over the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockGeometry {
    block_len: usize,
    block_count: usize,
}

impl Default for BlockGeometry {
    fn default() -> Self {
        Self {
            block_len: DMA_BYTES_PER_CHUNK,
            block_count: LA_DMA_COUNT,
        }
    }
}

impl BlockGeometry {
    /// Describe `block_count` blocks of `block_len` samples each
    ///
    /// The total must be a power of two so the ring can wrap by masking.
    pub fn new(block_len: usize, block_count: usize) -> Result<Self, BufferError> {
        let capacity = block_len
            .checked_mul(block_count)
            .ok_or(BufferError::GeometryMismatch)?;
        if capacity == 0 {
            return Err(BufferError::Empty);
        }
        if !capacity.is_power_of_two() {
            return Err(BufferError::NotPowerOfTwo);
        }
        Ok(Self {
            block_len,
            block_count,
        })
    }

    /// Samples per block
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Number of blocks in the chain
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Total samples covered by the chain
    pub fn capacity(&self) -> usize {
        self.block_len * self.block_count
    }

    /// Block that holds the (already wrapped) ring index
    pub fn block_of(&self, index: usize) -> usize {
        (index / self.block_len) % self.block_count
    }
}

/// 16.8 fixed-point clock divider for the sampling state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider {
    /// Integer part
    pub int: u16,
    /// Fractional part in 1/256 steps
    pub frac: u8,
}

impl ClockDivider {
    /// Divider that samples at `rate_hz`
    ///
    /// The state machine runs at `sys_clk_hz / divider` and spends
    /// `cycles_per_sample` cycles per sample, so
    /// `divider = sys_clk_hz / (rate_hz * cycles_per_sample)`.
    ///
    /// Returns `None` for a zero rate. Rates faster than the state machine
    /// can sample clamp to a divider of 1.0, slow rates clamp to the largest
    /// divider; [`effective_rate`](Self::effective_rate) reports the result.
    pub fn for_rate(sys_clk_hz: u32, rate_hz: u32, cycles_per_sample: u32) -> Option<Self> {
        let divisor = rate_hz as u64 * cycles_per_sample.max(1) as u64;
        if divisor == 0 {
            return None;
        }

        let divider_x256 = ((sys_clk_hz as u64 * 256) / divisor).max(256);

        let int_part = (divider_x256 / 256).min(0xFFFF) as u16;
        let frac_part = if divider_x256 / 256 > 0xFFFF {
            0xFF
        } else {
            (divider_x256 % 256) as u8
        };

        Some(Self {
            int: int_part,
            frac: frac_part,
        })
    }

    /// Divider as a 16.8 fixed-point value scaled by 256
    pub fn as_x256(&self) -> u32 {
        ((self.int as u32) << 8) | self.frac as u32
    }

    /// Sample rate this divider actually produces
    pub fn effective_rate(&self, sys_clk_hz: u32, cycles_per_sample: u32) -> u32 {
        let denom = self.as_x256() as u64 * cycles_per_sample.max(1) as u64;
        if denom == 0 {
            return 0;
        }
        ((sys_clk_hz as u64 * 256) / denom) as u32
    }
}
