//! Tracewire Hardware Abstraction Layer
//!
//! This crate defines the narrow hardware interfaces the capture core
//! consumes. Chip-specific code (USB CDC stacks, status LEDs) implements
//! them; the core never touches a peripheral directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tracewire-core (modes, capture engine) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tracewire-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  USB CDC /    │       │  status LED / │
//! │  loopback     │       │  GPIO pin     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Non-blocking byte-stream duplex channel
//! - [`indicator::Indicator`] - Capture activity indicator

#![no_std]
#![deny(unsafe_code)]

pub mod indicator;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use indicator::{Indicator, NoIndicator};
pub use transport::Transport;
