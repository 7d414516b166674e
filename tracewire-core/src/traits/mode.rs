//! Hardware personality trait
//!
//! Each personality supplies only the capabilities it needs; everything
//! else defaults to doing nothing.

use core::fmt;

use crate::mode::context::ModeContext;
use crate::mode::resources::Resource;

/// Reasons a personality cannot become active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// The shared capture memory is held by someone else
    OutOfMemory,
    /// A pin, clock or channel is claimed by another owner
    ResourceBusy(Resource),
    /// Pin number does not exist on this board
    InvalidPin(u8),
    /// No room left in the claim table
    TooManyClaims,
    /// Leased memory does not fit the capture geometry
    BufferGeometry,
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeError::OutOfMemory => f.write_str("out of memory"),
            ModeError::ResourceBusy(resource) => write!(f, "{} already in use", resource),
            ModeError::InvalidPin(pin) => write!(f, "no pin {}", pin),
            ModeError::TooManyClaims => f.write_str("resource table full"),
            ModeError::BufferGeometry => f.write_str("capture buffer geometry mismatch"),
        }
    }
}

/// One selectable hardware personality
///
/// `'m` is the lifetime of the shared capture memory a mode may lease.
pub trait Mode<'m> {
    /// Display name
    fn name(&self) -> &'static str;

    /// Claim resources and prepare the hardware
    ///
    /// On error the mode must leave nothing claimed.
    fn setup(&mut self, _ctx: &mut ModeContext<'_, 'm>) -> Result<(), ModeError> {
        Ok(())
    }

    /// Per-tick work
    fn service(&mut self, _ctx: &mut ModeContext<'_, 'm>) {}

    /// Release everything `setup` claimed
    fn cleanup(&mut self, _ctx: &mut ModeContext<'_, 'm>) {}

    /// Set the operating frequency
    fn configure(&mut self, _ctx: &mut ModeContext<'_, 'm>, _frequency_hz: u32) {}

    /// Begin the mode's activity (e.g. arm a capture)
    fn start(&mut self, _ctx: &mut ModeContext<'_, 'm>) {}

    /// End the mode's activity, keeping results available
    fn stop(&mut self, _ctx: &mut ModeContext<'_, 'm>) {}

    /// Print results for the operator
    fn report(&mut self, _ctx: &mut ModeContext<'_, 'm>) {}
}
