//! Operator-facing configuration
//!
//! Values set from the command line or menu layer. Loading and saving them
//! is left to the firmware.

use core::fmt;

use crate::capture::config::{DEFAULT_FREQUENCY_HZ, DEFAULT_OVERSAMPLING};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transport sub-channel the follow-along analyzer streams on
pub const DEFAULT_LA_CHANNEL: u8 = 1;

/// Follow-along logic analyzer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FollowAlongConfig {
    /// Requested capture frequency in Hz
    pub frequency_hz: u32,
    /// Oversampling factor applied on top of the frequency
    pub oversample: u32,
    /// Light the activity indicator while capturing
    pub indicator: bool,
    /// Transport sub-channel for status frames and dumps
    pub channel: u8,
}

impl Default for FollowAlongConfig {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            oversample: DEFAULT_OVERSAMPLING,
            indicator: false,
            channel: DEFAULT_LA_CHANNEL,
        }
    }
}

impl FollowAlongConfig {
    /// Effective sampling clock (frequency × oversampling)
    pub fn sample_rate_hz(&self) -> u32 {
        self.frequency_hz.saturating_mul(self.oversample.max(1))
    }
}

/// Index into the mode table, valid for a table of a known size
///
/// Only constructed through [`ModeSelector::new`], so holding one means the
/// index was checked against the table it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ModeSelector(usize);

/// Selector outside the mode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectorOutOfRange {
    /// Requested index
    pub index: usize,
    /// Number of modes in the table
    pub count: usize,
}

impl fmt::Display for SelectorOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode {} out of range (0..{})", self.index, self.count)
    }
}

impl ModeSelector {
    /// First mode in the table (the safe default)
    pub const FIRST: Self = Self(0);

    /// Validate `index` against a table of `count` modes
    pub fn new(index: usize, count: usize) -> Result<Self, SelectorOutOfRange> {
        if index < count {
            Ok(Self(index))
        } else {
            Err(SelectorOutOfRange { index, count })
        }
    }

    /// Table index
    pub fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_along_defaults() {
        let config = FollowAlongConfig::default();
        assert_eq!(config.frequency_hz, 1_000_000);
        assert_eq!(config.oversample, 8);
        assert_eq!(config.sample_rate_hz(), 8_000_000);
        assert_eq!(config.channel, 1);
        assert!(!config.indicator);
    }

    #[test]
    fn test_selector_bounds() {
        assert_eq!(ModeSelector::new(1, 2).map(ModeSelector::index), Ok(1));
        assert_eq!(
            ModeSelector::new(2, 2),
            Err(SelectorOutOfRange { index: 2, count: 2 })
        );
        assert!(ModeSelector::new(0, 0).is_err());
        assert_eq!(ModeSelector::default(), ModeSelector::FIRST);
    }
}
