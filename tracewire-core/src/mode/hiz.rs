//! High-impedance safe mode
//!
//! Default personality: every pin floats and nothing is claimed, so any
//! other mode can be activated from here.

use crate::traits::mode::Mode;

/// Display name
pub const HIZ_NAME: &str = "HiZ";

/// Mode that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct HizMode;

impl<'m> Mode<'m> for HizMode {
    fn name(&self) -> &'static str {
        HIZ_NAME
    }
}
