//! Sampling data path trait
//!
//! A sampler owns the peripheral clock and the chained transfer blocks
//! that move pin states into memory. It is the only actor allowed to move
//! the ring's write cursor, which it does through a [`RingWriter`].

use crate::capture::buffer::RingWriter;
use crate::capture::geometry::{BlockGeometry, ClockDivider};

/// Everything a sampler needs to start a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapturePlan {
    /// Sampling clock in Hz (frequency × oversampling)
    pub sample_rate_hz: u32,
    /// Clock divider that produces the sampling clock
    pub divider: ClockDivider,
    /// Transfer block layout over the ring
    pub geometry: BlockGeometry,
    /// Ring index the first sample will occupy
    pub first_index: usize,
    /// Samples to capture before the capture completes
    pub total_samples: u32,
    /// Light the activity indicator while capturing
    pub indicator: bool,
}

impl CapturePlan {
    /// Block the first sample lands in
    pub fn first_block(&self) -> usize {
        self.geometry.block_of(self.first_index)
    }
}

/// Peripheral-driven sample source
pub trait Sampler {
    /// Error type for starting the hardware
    type Error;

    /// Start the sampling clock and queue the transfer chain
    ///
    /// The block holding `plan.first_index` runs first; the following block
    /// must already be queued when it fills.
    fn start(&mut self, plan: &CapturePlan) -> Result<(), Self::Error>;

    /// Halt the clock and the transfer chain immediately
    fn stop(&mut self);

    /// Check if the sampling clock is running
    fn is_running(&self) -> bool;

    /// Publish samples that arrived since the last call
    ///
    /// Returns the number of samples deposited through `ring`.
    fn deposit(&mut self, ring: &mut RingWriter<'_>) -> usize;
}
