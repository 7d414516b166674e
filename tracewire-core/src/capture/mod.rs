//! Logic analyzer capture
//!
//! Ring storage, transfer geometry, triggering and the engine that ties
//! them together, plus the host streaming session that reads captures out.

pub mod buffer;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod session;
pub mod trigger;

pub use buffer::{BufferError, CaptureBuffer, RingWriter};
pub use config::CaptureConfig;
pub use engine::{CaptureEngine, CaptureError, CaptureState};
pub use geometry::{BlockGeometry, ClockDivider, CAPTURE_CAPACITY};
pub use session::StreamingSession;
pub use trigger::{TriggerConfig, TriggerHit};
