//! Sampler implementations

pub mod indicated;
pub mod sim;

pub use indicated::IndicatedSampler;
pub use sim::{Pattern, SimError, SimSampler};
