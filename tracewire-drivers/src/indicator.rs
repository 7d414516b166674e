//! GPIO capture indicator
//!
//! Drives a status LED through an `embedded-hal` output pin. The pin can be
//! active-high (default) or active-low.

use embedded_hal::digital::OutputPin;
use tracewire_hal::Indicator;

/// Indicator on a GPIO pin
pub struct PinIndicator<P> {
    pin: P,
    /// If true, indicator ON = pin LOW
    inverted: bool,
    active: bool,
}

impl<P: OutputPin> PinIndicator<P> {
    /// Create an indicator, initially off
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut indicator = Self {
            pin,
            inverted,
            active: false,
        };
        indicator.set_active(false);
        indicator
    }

    /// Indicator lit when the pin is high
    pub fn active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    /// Indicator lit when the pin is low
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> Indicator for PinIndicator<P> {
    fn set_active(&mut self, active: bool) {
        self.active = active;

        let result = if active != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            warn!("Indicator pin write failed");
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct MockPin {
        high: bool,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    #[test]
    fn test_active_high() {
        let mut led = PinIndicator::active_high(MockPin { high: true });
        assert!(!led.is_active());

        led.set_active(true);
        assert!(led.is_active());
        assert!(led.release().high);
    }

    #[test]
    fn test_active_low() {
        let mut led = PinIndicator::active_low(MockPin::default());
        // Off means the pin is driven high
        assert!(!led.is_active());

        led.set_active(true);
        assert!(!led.release().high);
    }
}
