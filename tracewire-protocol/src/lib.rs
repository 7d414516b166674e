//! Follow-along Logic Analyzer Host Protocol
//!
//! This crate defines the byte protocol spoken between the capture core and
//! the host application over a dedicated transport sub-channel.
//!
//! # Protocol Overview
//!
//! The host drives the exchange with single ASCII command bytes:
//! ```text
//! host → device   '?'  request a status frame
//! host → device   '+'  request a bulk dump of every available sample
//! ```
//!
//! The device answers a `?` with one newline-terminated ASCII frame:
//! ```text
//! $FALADATA;<channels>;<trigger pin>;<trigger mask>;<edge>;<rate hz>;<samples>;<pre-trigger>;\n
//! ```
//!
//! and a `+` with raw sample bytes, no framing, most recent sample first,
//! sent in chunks of at most [`CHUNK_SIZE`] bytes. The host learns the byte
//! count from a preceding status frame.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod status;

pub use command::HostCommand;
pub use status::{EdgeFlag, StatusError, StatusFrame, STATUS_FRAME_MAX, STATUS_PREFIX};

/// Number of digital channels in every sample (one bit per channel)
pub const CHANNEL_COUNT: u8 = 8;

/// Largest packet written to the transport in one go
///
/// Status frames and dump chunks are both bounded by this size.
pub const CHUNK_SIZE: usize = 64;
