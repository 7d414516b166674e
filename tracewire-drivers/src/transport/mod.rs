//! Transport implementations

pub mod io;
pub mod loopback;

pub use io::IoTransport;
pub use loopback::{DevicePort, HostPort, Loopback};
