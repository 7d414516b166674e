//! Capture engine
//!
//! Owns arming, trigger evaluation and cursor bookkeeping for one capture
//! buffer. The sampler moves the write cursor; everything else only reads.
//!
//! # States
//!
//! ```text
//!   configure ─► Idle ──arm──► Armed ──sampler started──► Capturing
//!                 ▲                                          │
//!                 └──────── configure ◄── Done ◄─────────────┘
//!                                        (total reached or stop)
//! ```
//!
//! Reads walk backward in time from the most recent sample. After
//! [`reset_read_ptr`](CaptureEngine::reset_read_ptr) the read cursor sits on
//! the newest sample and [`read_at`](CaptureEngine::read_at) offset `k`
//! returns the sample deposited `k` samples earlier.

use core::fmt;

use super::buffer::{BufferError, CaptureBuffer};
use super::config::CaptureConfig;
use super::geometry::{BlockGeometry, ClockDivider, CYCLES_PER_SAMPLE, SYS_CLK_HZ};
use super::trigger::{TriggerHit, TriggerTracker};
use crate::traits::sampler::{CapturePlan, Sampler};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureState {
    /// Nothing scheduled
    Idle,
    /// Arm requested, sampler not yet running
    Armed,
    /// Sampling clock running, blocks chained
    Capturing,
    /// Capture finished; data stays readable until the next configure/arm
    Done,
}

/// Reasons a configure or arm request is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureError {
    /// Requested sample count exceeds the buffer capacity
    TooManySamples { requested: u32, capacity: u32 },
    /// Requested sample count is zero
    ZeroSamples,
    /// Requested sample rate is zero
    RateUnsupported,
    /// A capture is in progress
    Busy,
    /// The sampler failed to start
    SamplerFault,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::TooManySamples {
                requested,
                capacity,
            } => write!(f, "{} samples requested, buffer holds {}", requested, capacity),
            CaptureError::ZeroSamples => write!(f, "no samples requested"),
            CaptureError::RateUnsupported => write!(f, "no sample rate set"),
            CaptureError::Busy => write!(f, "capture in progress"),
            CaptureError::SamplerFault => write!(f, "sampler did not start"),
        }
    }
}

/// Read position, walking backward from the newest sample
#[derive(Debug, Clone, Copy, Default)]
struct ReadCursor {
    /// Ring index of the next sample to read
    index: usize,
    /// Samples left before reaching the start of the capture
    available: u32,
}

/// Capture engine over a borrowed ring
pub struct CaptureEngine<'m> {
    ring: CaptureBuffer<'m>,
    geometry: BlockGeometry,
    sys_clk_hz: u32,
    config: CaptureConfig,
    divider: Option<ClockDivider>,
    state: CaptureState,
    /// Samples deposited since arming
    deposited: u32,
    trigger: TriggerTracker,
    read: ReadCursor,
}

impl<'m> CaptureEngine<'m> {
    /// Build an engine over `storage`, which must match `geometry`
    pub fn new(storage: &'m mut [u8], geometry: BlockGeometry) -> Result<Self, BufferError> {
        if storage.len() != geometry.capacity() {
            return Err(BufferError::GeometryMismatch);
        }
        let ring = CaptureBuffer::new(storage)?;
        let config = CaptureConfig {
            total_samples: ring.capacity() as u32,
            ..CaptureConfig::default()
        };
        let read = ReadCursor {
            index: ring.write_cursor(),
            available: 0,
        };

        Ok(Self {
            ring,
            geometry,
            sys_clk_hz: SYS_CLK_HZ,
            divider: ClockDivider::for_rate(SYS_CLK_HZ, config.sample_rate_hz(), CYCLES_PER_SAMPLE),
            config,
            state: CaptureState::Idle,
            deposited: 0,
            trigger: TriggerTracker::new(config.trigger),
            read,
        })
    }

    /// Use a different system clock for divider calculations
    pub fn with_system_clock(mut self, sys_clk_hz: u32) -> Self {
        self.sys_clk_hz = sys_clk_hz;
        self.divider =
            ClockDivider::for_rate(sys_clk_hz, self.config.sample_rate_hz(), CYCLES_PER_SAMPLE);
        self
    }

    /// Release the engine and hand back its storage
    pub fn into_storage(self) -> &'m mut [u8] {
        self.ring.into_storage()
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Active configuration
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Buffer capacity in samples
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Transfer block layout
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// Sample rate the sampling clock actually runs at
    ///
    /// Lower than the configured rate when the request is faster than the
    /// system clock allows. Zero when no rate is set.
    pub fn effective_rate_hz(&self) -> u32 {
        self.divider
            .map(|divider| divider.effective_rate(self.sys_clk_hz, CYCLES_PER_SAMPLE))
            .unwrap_or(0)
    }

    /// Index of the most recently deposited sample
    pub fn write_cursor(&self) -> usize {
        self.ring.write_cursor()
    }

    /// Samples deposited since arming
    pub fn deposited(&self) -> u32 {
        self.deposited
    }

    /// First trigger hit of the current capture
    pub fn trigger_hit(&self) -> Option<TriggerHit> {
        self.trigger.hit()
    }

    /// Check if a capture is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self.state, CaptureState::Armed | CaptureState::Capturing)
    }

    /// Store a new configuration and reset the read side
    ///
    /// Rejected without any state change when a capture is in progress or
    /// the request does not fit the buffer. The write cursor is kept: the
    /// next capture continues where the previous one stopped.
    pub fn configure(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }
        if config.total_samples == 0 {
            return Err(CaptureError::ZeroSamples);
        }
        let capacity = self.ring.capacity() as u32;
        if config.total_samples > capacity {
            warn!(
                "Capture of {} samples rejected, capacity is {}",
                config.total_samples, capacity
            );
            return Err(CaptureError::TooManySamples {
                requested: config.total_samples,
                capacity,
            });
        }
        let divider =
            ClockDivider::for_rate(self.sys_clk_hz, config.sample_rate_hz(), CYCLES_PER_SAMPLE)
                .ok_or(CaptureError::RateUnsupported)?;

        self.config = config;
        self.divider = Some(divider);
        self.trigger.set_config(config.trigger);
        self.deposited = 0;
        self.state = CaptureState::Idle;
        self.reset_read_ptr();

        debug!(
            "Capture configured: {} Hz, {} samples",
            config.sample_rate_hz(),
            config.total_samples
        );
        Ok(())
    }

    /// Start sampling into the ring
    ///
    /// Deposition starts right after the previous capture's last sample.
    pub fn arm<S: Sampler>(&mut self, sampler: &mut S, indicator: bool) -> Result<(), CaptureError> {
        if self.is_busy() {
            return Err(CaptureError::Busy);
        }
        let divider = self.divider.ok_or(CaptureError::RateUnsupported)?;

        self.state = CaptureState::Armed;
        self.deposited = 0;
        self.trigger.reset();
        self.reset_read_ptr();

        let plan = CapturePlan {
            sample_rate_hz: self.config.sample_rate_hz(),
            divider,
            geometry: self.geometry,
            first_index: self.ring.next_write_index(),
            total_samples: self.config.total_samples,
            indicator,
        };

        if sampler.start(&plan).is_err() {
            error!("Sampler failed to start");
            self.state = CaptureState::Idle;
            return Err(CaptureError::SamplerFault);
        }

        self.state = CaptureState::Capturing;
        info!(
            "Capture armed at {} Hz from block {}",
            plan.sample_rate_hz,
            plan.first_block()
        );
        Ok(())
    }

    /// Collect samples the data path produced since the last poll
    ///
    /// Evaluates the trigger on every new sample and finishes the capture
    /// once the requested count is reached. Returns the number of new samples.
    pub fn poll<S: Sampler>(&mut self, sampler: &mut S) -> u32 {
        if self.state != CaptureState::Capturing {
            return 0;
        }

        let before = self.ring.write_cursor();
        let budget = (self.config.total_samples - self.deposited) as usize;
        let count = {
            let mut writer = self.ring.writer(budget);
            sampler.deposit(&mut writer);
            writer.written()
        };

        for i in 0..count {
            let index = self.ring.wrap(before.wrapping_add(i + 1));
            let sample = self.ring.get(index);
            if self
                .trigger
                .observe(sample, index, self.deposited + i as u32)
            {
                info!("Trigger hit at index {}", index);
            }
        }

        let block_before = self.geometry.block_of(before);
        let block_after = self.geometry.block_of(self.ring.write_cursor());
        if count > 0 && block_before != block_after {
            trace!("Transfer block {} complete", block_before);
        }

        self.deposited += count as u32;
        if self.deposited >= self.config.total_samples {
            sampler.stop();
            self.state = CaptureState::Done;
            info!("Capture done, {} samples", self.deposited);
        }
        count as u32
    }

    /// Halt sampling now, keeping what was captured
    pub fn stop<S: Sampler>(&mut self, sampler: &mut S) {
        if self.is_busy() {
            sampler.stop();
            self.state = CaptureState::Done;
            info!("Capture stopped, {} samples", self.deposited);
        }
    }

    /// Check if the capture has finished
    pub fn is_done(&self) -> bool {
        self.state == CaptureState::Done
    }

    /// Put the read cursor on the most recent sample
    pub fn reset_read_ptr(&mut self) {
        self.read = ReadCursor {
            index: self.ring.write_cursor(),
            available: self.deposited,
        };
    }

    /// Samples readable from the current read cursor
    pub fn get_ptr(&self) -> u32 {
        self.read.available
    }

    /// Peek at the sample `offset` positions before the read cursor
    pub fn read_at(&self, offset: usize) -> u8 {
        self.ring.back_from(self.read.index, offset)
    }

    /// Copy samples out, walking the read cursor backward
    ///
    /// Copies at most `out.len()`, `*remaining` and [`get_ptr`](Self::get_ptr)
    /// samples, newest first, and decrements `*remaining` by the count copied.
    pub fn dump_next(&mut self, out: &mut [u8], remaining: &mut u32) -> usize {
        let count = out
            .len()
            .min(*remaining as usize)
            .min(self.read.available as usize);

        for slot in out.iter_mut().take(count) {
            *slot = self.ring.get(self.read.index);
            self.read.index = self.ring.wrap(self.read.index.wrapping_sub(1));
        }

        self.read.available -= count as u32;
        *remaining -= count as u32;
        count
    }
}
