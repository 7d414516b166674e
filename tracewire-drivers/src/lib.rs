//! Concrete collaborators for the Tracewire core
//!
//! Implementations of the core's sampler and the HAL's transport and
//! indicator traits:
//!
//! - Simulated sampler (software pattern source in place of the PIO/DMA path)
//! - Indicator-wrapping sampler and an `embedded-hal` pin indicator
//! - In-memory loopback transport with a host-side port
//! - `embedded-io` transport adapter

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod indicator;
pub mod sampler;
pub mod transport;

pub use indicator::PinIndicator;
pub use sampler::{IndicatedSampler, Pattern, SimError, SimSampler};
pub use transport::{DevicePort, HostPort, IoTransport, Loopback};
