//! Simulated sampler
//!
//! Produces a deterministic pin pattern in software, a fixed number of
//! samples per poll, walking the same chained block layout the DMA path
//! would. Used on the host and for bring-up before the PIO program runs.

use tracewire_core::capture::buffer::RingWriter;
use tracewire_core::traits::{CapturePlan, Sampler};

/// Sample source for [`SimSampler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<'s> {
    /// Sample `n` is `n as u8`
    Counter,
    /// Every sample has the same value
    Constant(u8),
    /// One high channel, rotating through all eight
    WalkingOne,
    /// Replay a recording, wrapping at its end
    Replay(&'s [u8]),
}

impl Pattern<'_> {
    /// Value of sample `n`
    pub fn sample(&self, n: u32) -> u8 {
        match self {
            Pattern::Counter => n as u8,
            Pattern::Constant(value) => *value,
            Pattern::WalkingOne => 1 << (n % 8),
            Pattern::Replay(data) => {
                if data.is_empty() {
                    0
                } else {
                    data.get(n as usize % data.len()).copied().unwrap_or(0)
                }
            }
        }
    }
}

/// Simulated sampler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimError {
    /// The plan asks for a faster clock than the simulation allows
    RateTooHigh { requested: u32, max: u32 },
}

/// Software sample source
pub struct SimSampler<'s> {
    pattern: Pattern<'s>,
    burst: usize,
    max_rate_hz: u32,
    running: bool,
    produced: u32,
    plan: Option<CapturePlan>,
    block: usize,
    blocks_completed: u32,
}

impl<'s> SimSampler<'s> {
    /// Sampler producing `pattern`, `burst` samples per poll
    pub fn new(pattern: Pattern<'s>, burst: usize) -> Self {
        Self {
            pattern,
            burst,
            max_rate_hz: u32::MAX,
            running: false,
            produced: 0,
            plan: None,
            block: 0,
            blocks_completed: 0,
        }
    }

    /// Reject plans faster than `max_rate_hz`
    pub fn with_max_rate(mut self, max_rate_hz: u32) -> Self {
        self.max_rate_hz = max_rate_hz;
        self
    }

    /// Plan of the most recent start
    pub fn plan(&self) -> Option<&CapturePlan> {
        self.plan.as_ref()
    }

    /// Samples produced since creation
    pub fn produced(&self) -> u32 {
        self.produced
    }

    /// Transfer blocks filled since creation
    pub fn blocks_completed(&self) -> u32 {
        self.blocks_completed
    }
}

impl Sampler for SimSampler<'_> {
    type Error = SimError;

    fn start(&mut self, plan: &CapturePlan) -> Result<(), SimError> {
        if plan.sample_rate_hz > self.max_rate_hz {
            return Err(SimError::RateTooHigh {
                requested: plan.sample_rate_hz,
                max: self.max_rate_hz,
            });
        }
        self.plan = Some(*plan);
        self.block = plan.first_block();
        self.running = true;
        debug!(
            "Sim sampler at {} Hz, divider {}.{}",
            plan.sample_rate_hz,
            plan.divider.int,
            plan.divider.frac
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn deposit(&mut self, ring: &mut RingWriter<'_>) -> usize {
        let Some(plan) = self.plan.filter(|_| self.running) else {
            return 0;
        };

        let mut count = 0;
        while count < self.burst {
            let index = ring.next_index();
            if !ring.push(self.pattern.sample(self.produced)) {
                break;
            }
            self.produced = self.produced.wrapping_add(1);
            count += 1;

            let block = plan.geometry.block_of(index);
            if block != self.block {
                trace!("Block {} full, block {} running", self.block, block);
                self.blocks_completed += 1;
                self.block = block;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracewire_core::capture::{BlockGeometry, CaptureBuffer, ClockDivider};

    fn plan(geometry: BlockGeometry, first_index: usize) -> CapturePlan {
        CapturePlan {
            sample_rate_hz: 8_000_000,
            divider: ClockDivider { int: 15, frac: 160 },
            geometry,
            first_index,
            total_samples: geometry.capacity() as u32,
            indicator: false,
        }
    }

    #[test]
    fn test_patterns() {
        assert_eq!(Pattern::Counter.sample(258), 2);
        assert_eq!(Pattern::Constant(0xAA).sample(9), 0xAA);
        assert_eq!(Pattern::WalkingOne.sample(3), 0x08);
        assert_eq!(Pattern::WalkingOne.sample(8), 0x01);
        assert_eq!(Pattern::Replay(&[1, 2, 3]).sample(4), 2);
        assert_eq!(Pattern::Replay(&[]).sample(4), 0);
    }

    #[test]
    fn test_idle_sampler_deposits_nothing() {
        let mut storage = [0u8; 16];
        let mut ring = CaptureBuffer::new(&mut storage).unwrap();
        let mut sim = SimSampler::new(Pattern::Counter, 4);

        assert_eq!(sim.deposit(&mut ring.writer(16)), 0);
    }

    #[test]
    fn test_burst_and_budget() {
        let geometry = BlockGeometry::new(4, 4).unwrap();
        let mut storage = [0u8; 16];
        let mut ring = CaptureBuffer::new(&mut storage).unwrap();
        let mut sim = SimSampler::new(Pattern::Counter, 6);
        sim.start(&plan(geometry, 0)).unwrap();

        assert_eq!(sim.deposit(&mut ring.writer(16)), 6);
        assert_eq!(sim.deposit(&mut ring.writer(3)), 3);
        assert_eq!(ring.write_cursor(), 8);
        assert_eq!(ring.get(8), 8);
        // Crossed from block 0 into block 1 and then block 2
        assert_eq!(sim.blocks_completed(), 2);
    }

    #[test]
    fn test_rate_limit() {
        let geometry = BlockGeometry::new(4, 4).unwrap();
        let mut sim = SimSampler::new(Pattern::Counter, 1).with_max_rate(1_000_000);

        assert_eq!(
            sim.start(&plan(geometry, 0)),
            Err(SimError::RateTooHigh {
                requested: 8_000_000,
                max: 1_000_000
            })
        );
        assert!(!sim.is_running());
    }
}
