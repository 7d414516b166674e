//! Trigger evaluation
//!
//! A trigger compares the masked channel bits of each deposited sample
//! against a pattern. Level triggers fire on the first matching sample;
//! edge triggers fire on the first sample that matches after one that did
//! not. Only the first hit is recorded: capture keeps filling the ring
//! afterwards so pre-trigger context stays available.

use tracewire_protocol::EdgeFlag;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trigger condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriggerConfig {
    /// Channels that participate (bit n = channel n)
    pub mask: u8,
    /// Required level of each participating channel
    pub pattern: u8,
    /// Fire on the transition into the pattern rather than on the level
    pub edge: bool,
}

impl TriggerConfig {
    /// No trigger; capture is free-running
    pub const NONE: Self = Self {
        mask: 0,
        pattern: 0,
        edge: false,
    };

    /// Level trigger on the masked pattern
    pub const fn level(mask: u8, pattern: u8) -> Self {
        Self {
            mask,
            pattern,
            edge: false,
        }
    }

    /// Edge trigger on the transition into the masked pattern
    pub const fn edge(mask: u8, pattern: u8) -> Self {
        Self {
            mask,
            pattern,
            edge: true,
        }
    }

    /// Check if any channel participates
    pub fn is_enabled(&self) -> bool {
        self.mask != 0
    }

    /// Check if a sample satisfies the masked pattern
    #[inline]
    pub fn matches(&self, sample: u8) -> bool {
        (sample & self.mask) == (self.pattern & self.mask)
    }

    /// Lowest participating channel, reported as the trigger pin
    pub fn pin(&self) -> u8 {
        if self.mask == 0 {
            0
        } else {
            self.mask.trailing_zeros() as u8
        }
    }

    /// Edge flag as reported to the host
    pub fn edge_flag(&self) -> EdgeFlag {
        if !self.edge || self.mask == 0 {
            EdgeFlag::None
        } else if self.pattern & self.mask != 0 {
            EdgeFlag::Rising
        } else {
            EdgeFlag::Falling
        }
    }
}

/// Where the trigger fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerHit {
    /// Ring index of the triggering sample
    pub index: usize,
    /// Samples captured before the triggering one
    pub pre_trigger: u32,
}

/// Per-capture trigger state
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerTracker {
    config: TriggerConfig,
    previous_match: Option<bool>,
    hit: Option<TriggerHit>,
}

impl TriggerTracker {
    /// Create a tracker for `config`
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            previous_match: None,
            hit: None,
        }
    }

    /// Forget any previous hit, keeping the condition
    pub fn reset(&mut self) {
        self.previous_match = None;
        self.hit = None;
    }

    /// Replace the condition and reset
    pub fn set_config(&mut self, config: TriggerConfig) {
        self.config = config;
        self.reset();
    }

    /// Current condition
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// First hit of the current capture, if any
    pub fn hit(&self) -> Option<TriggerHit> {
        self.hit
    }

    /// Evaluate one deposited sample
    ///
    /// `sample_number` counts samples since arming, starting at zero.
    /// Returns `true` only for the sample that produced the first hit.
    pub fn observe(&mut self, sample: u8, index: usize, sample_number: u32) -> bool {
        if !self.config.is_enabled() || self.hit.is_some() {
            return false;
        }

        let matched = self.config.matches(sample);
        let fired = if self.config.edge {
            matched && self.previous_match == Some(false)
        } else {
            matched
        };
        self.previous_match = Some(matched);

        if fired {
            self.hit = Some(TriggerHit {
                index,
                pre_trigger: sample_number,
            });
        }
        fired
    }
}
