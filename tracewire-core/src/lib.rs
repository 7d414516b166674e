//! Board-agnostic core of the Tracewire debug tool
//!
//! This crate contains all logic that does not depend on a specific chip:
//!
//! - Mode registry and dispatcher (exactly one hardware personality active)
//! - Shared resource claims and the big-buffer memory pool
//! - Circular capture buffer, block and clock geometry, trigger evaluation
//! - Capture engine state machine (Idle / Armed / Capturing / Done)
//! - Host streaming session for the follow-along logic analyzer
//! - Built-in personalities (HiZ, follow-along logic analyzer)

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod capture;
pub mod config;
pub mod mode;
pub mod traits;

#[cfg(test)]
mod testing;
