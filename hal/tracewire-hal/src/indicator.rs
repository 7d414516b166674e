//! Capture activity indicator
//!
//! A visual cue (usually an LED) that is lit while the sampling clock runs.

/// Something that can show whether a capture is in progress
pub trait Indicator {
    /// Switch the indicator on or off
    fn set_active(&mut self, active: bool);

    /// Check if the indicator is currently on
    fn is_active(&self) -> bool;
}

/// Indicator for boards without one
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn set_active(&mut self, _active: bool) {}

    fn is_active(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_indicator_stays_dark() {
        let mut indicator = NoIndicator;
        indicator.set_active(true);
        assert!(!indicator.is_active());
    }
}
