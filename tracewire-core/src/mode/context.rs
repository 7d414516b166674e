//! What a mode may touch while it runs
//!
//! [`SharedResources`] is owned by the firmware's main loop and outlives
//! every mode. Each lifecycle call gets a [`ModeContext`] that borrows it
//! together with the operator console, tagged with the calling mode's id.

use core::fmt;

use super::memory::BigBuffer;
use super::resources::{Owner, Resource, ResourceError, ResourceTable};
use crate::traits::mode::ModeError;

/// Enable flags for the generic binary-mode transport queues
///
/// Modes that speak their own protocol on a sub-channel switch the generic
/// queues off for that channel while they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BinaryQueues {
    rx_disabled: u8,
    tx_disabled: u8,
}

impl BinaryQueues {
    /// All queues enabled
    pub const fn new() -> Self {
        Self {
            rx_disabled: 0,
            tx_disabled: 0,
        }
    }

    /// Enable or disable both queues of `channel` (0..8)
    pub fn set_enabled(&mut self, channel: u8, enabled: bool) {
        let bit = 1u8 << (channel & 7);
        if enabled {
            self.rx_disabled &= !bit;
            self.tx_disabled &= !bit;
        } else {
            self.rx_disabled |= bit;
            self.tx_disabled |= bit;
        }
    }

    /// Check if the RX queue of `channel` is enabled
    pub fn rx_enabled(&self, channel: u8) -> bool {
        self.rx_disabled & (1 << (channel & 7)) == 0
    }

    /// Check if the TX queue of `channel` is enabled
    pub fn tx_enabled(&self, channel: u8) -> bool {
        self.tx_disabled & (1 << (channel & 7)) == 0
    }
}

/// State shared by all modes
pub struct SharedResources<'m> {
    /// Pin, clock and channel claims
    pub resources: ResourceTable,
    /// Bulk memory pool
    pub memory: BigBuffer<'m>,
    /// Generic binary queue switches
    pub queues: BinaryQueues,
}

impl<'m> SharedResources<'m> {
    /// Shared state around the big-buffer `region`
    pub fn new(region: &'m mut [u8]) -> Self {
        Self {
            resources: ResourceTable::new(),
            memory: BigBuffer::new(region),
            queues: BinaryQueues::new(),
        }
    }

    /// Borrow everything for one call into mode `owner`
    pub fn context<'c>(
        &'c mut self,
        console: &'c mut dyn fmt::Write,
        owner: Owner,
    ) -> ModeContext<'c, 'm> {
        ModeContext {
            resources: &mut self.resources,
            memory: &mut self.memory,
            queues: &mut self.queues,
            console,
            owner,
        }
    }
}

/// Per-call view of the shared state
pub struct ModeContext<'c, 'm> {
    /// Pin, clock and channel claims
    pub resources: &'c mut ResourceTable,
    /// Bulk memory pool
    pub memory: &'c mut BigBuffer<'m>,
    /// Generic binary queue switches
    pub queues: &'c mut BinaryQueues,
    /// Operator console
    pub console: &'c mut dyn fmt::Write,
    owner: Owner,
}

impl<'c, 'm> ModeContext<'c, 'm> {
    /// Id of the mode this context was built for
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Claim `resource` for the calling mode
    pub fn claim(&mut self, resource: Resource) -> Result<(), ModeError> {
        self.resources
            .claim(resource, self.owner)
            .map_err(|err| match err {
                ResourceError::AlreadyClaimed { owner, .. } => {
                    debug!("{} held by mode {}", resource, owner);
                    ModeError::ResourceBusy(resource)
                }
                ResourceError::InvalidPin(pin) => ModeError::InvalidPin(pin),
                ResourceError::TableFull => {
                    warn!("Resource table full, {} not claimed", resource);
                    ModeError::TooManyClaims
                }
            })
    }

    /// Release `resource` if the calling mode holds it
    pub fn release(&mut self, resource: Resource) {
        self.resources.release(resource, self.owner);
    }

    /// Lease the big buffer
    pub fn lease_memory(&mut self) -> Result<&'m mut [u8], ModeError> {
        self.memory.claim(self.owner).map_err(|err| {
            warn!("Big buffer unavailable: {}", err);
            ModeError::OutOfMemory
        })
    }

    /// Return the big buffer
    pub fn return_memory(&mut self, region: &'m mut [u8]) {
        self.memory.release(region);
    }

    /// Write operator text, ignoring console errors
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.console.write_fmt(args);
    }
}
