//! Capture configuration

use super::geometry::CAPTURE_CAPACITY;
use super::trigger::TriggerConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default requested sample frequency
pub const DEFAULT_FREQUENCY_HZ: u32 = 1_000_000;

/// Default oversampling factor
pub const DEFAULT_OVERSAMPLING: u32 = 8;

/// What to capture and how fast
///
/// Only changed while the engine is not capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaptureConfig {
    /// Requested sample frequency in Hz
    pub frequency_hz: u32,
    /// Multiplier applied to the frequency to get the sampling clock
    pub oversampling: u32,
    /// Samples to deposit before the capture completes
    pub total_samples: u32,
    /// Trigger condition
    pub trigger: TriggerConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            oversampling: DEFAULT_OVERSAMPLING,
            total_samples: CAPTURE_CAPACITY as u32,
            trigger: TriggerConfig::NONE,
        }
    }
}

impl CaptureConfig {
    /// Untriggered capture of `total_samples` at `frequency_hz`
    pub fn new(frequency_hz: u32, total_samples: u32) -> Self {
        Self {
            frequency_hz,
            total_samples,
            ..Self::default()
        }
    }

    /// Set the oversampling factor
    pub fn with_oversampling(mut self, oversampling: u32) -> Self {
        self.oversampling = oversampling;
        self
    }

    /// Set the trigger condition
    pub fn with_trigger(mut self, trigger: TriggerConfig) -> Self {
        self.trigger = trigger;
        self
    }

    /// Effective sampling clock (frequency × oversampling)
    pub fn sample_rate_hz(&self) -> u32 {
        self.frequency_hz.saturating_mul(self.oversampling.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate_hz(), 8_000_000);
        assert_eq!(config.total_samples, 131_072);
    }

    #[test]
    fn test_rate_saturates() {
        let config = CaptureConfig::new(u32::MAX, 1).with_oversampling(8);
        assert_eq!(config.sample_rate_hz(), u32::MAX);
    }

    #[test]
    fn test_zero_oversampling_counts_as_one() {
        let config = CaptureConfig::new(1000, 1).with_oversampling(0);
        assert_eq!(config.sample_rate_hz(), 1000);
    }
}
