//! Mode registry and built-in personalities
//!
//! Exactly one personality is active at a time. The registry owns the
//! switching order; the shared resource table and big-buffer pool make
//! sure a mode that is not active holds nothing.

pub mod context;
pub mod follow_along;
pub mod hiz;
pub mod memory;
pub mod registry;
pub mod resources;

pub use context::{BinaryQueues, ModeContext, SharedResources};
pub use follow_along::FollowAlongMode;
pub use hiz::HizMode;
pub use memory::{BigBuffer, MemoryError};
pub use registry::{ModeRegistry, RegistryError};
pub use resources::{Owner, Resource, ResourceError, ResourceTable};
