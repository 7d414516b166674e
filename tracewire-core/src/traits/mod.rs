//! Hardware and personality traits
//!
//! These traits define the interface between the dispatcher/capture logic
//! and the implementations plugged into it.

pub mod mode;
pub mod sampler;

pub use mode::{Mode, ModeError};
pub use sampler::{CapturePlan, Sampler};
