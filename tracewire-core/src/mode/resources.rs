//! Shared resource claims
//!
//! Tracks which mode holds each pin, the sampling clock and each transport
//! sub-channel, so two modes can never drive the same hardware.

use core::fmt;

use heapless::FnvIndexMap;

/// Number of GPIO pins on the target
pub const PIN_COUNT: u8 = 30;

/// Maximum simultaneous claims
pub const MAX_CLAIMS: usize = 32;

/// Mode table index that owns a claim
pub type Owner = usize;

/// A piece of hardware a mode can hold exclusively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resource {
    /// GPIO pin
    Pin(u8),
    /// Peripheral clock that paces sampling
    SampleClock,
    /// Sub-channel of the host transport
    TransportChannel(u8),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Pin(pin) => write!(f, "pin {}", pin),
            Resource::SampleClock => f.write_str("sampling clock"),
            Resource::TransportChannel(channel) => write!(f, "transport channel {}", channel),
        }
    }
}

/// Resource claim errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResourceError {
    /// Held by another mode
    AlreadyClaimed { resource: Resource, owner: Owner },
    /// Pin number does not exist
    InvalidPin(u8),
    /// Claim table is full
    TableFull,
}

/// Claim table
pub struct ResourceTable {
    claims: FnvIndexMap<Resource, Owner, MAX_CLAIMS>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            claims: FnvIndexMap::new(),
        }
    }

    /// Claim `resource` for `owner`
    ///
    /// Claiming something the owner already holds succeeds.
    pub fn claim(&mut self, resource: Resource, owner: Owner) -> Result<(), ResourceError> {
        if let Resource::Pin(pin) = resource {
            if pin >= PIN_COUNT {
                return Err(ResourceError::InvalidPin(pin));
            }
        }
        match self.claims.get(&resource) {
            Some(&holder) if holder == owner => Ok(()),
            Some(&holder) => Err(ResourceError::AlreadyClaimed {
                resource,
                owner: holder,
            }),
            None => self
                .claims
                .insert(resource, owner)
                .map(|_| ())
                .map_err(|_| ResourceError::TableFull),
        }
    }

    /// Release `resource` if `owner` holds it
    ///
    /// Returns `true` if a claim was removed.
    pub fn release(&mut self, resource: Resource, owner: Owner) -> bool {
        if self.owner_of(resource) == Some(owner) {
            self.claims.remove(&resource);
            true
        } else {
            false
        }
    }

    /// Release every claim held by `owner`
    ///
    /// Returns the number of claims removed.
    pub fn release_all(&mut self, owner: Owner) -> usize {
        let mut held: heapless::Vec<Resource, MAX_CLAIMS> = heapless::Vec::new();
        for (&resource, &holder) in self.claims.iter() {
            if holder == owner {
                // Same capacity as the map, cannot overflow
                let _ = held.push(resource);
            }
        }
        for resource in &held {
            self.claims.remove(resource);
        }
        held.len()
    }

    /// Current holder of `resource`
    pub fn owner_of(&self, resource: Resource) -> Option<Owner> {
        self.claims.get(&resource).copied()
    }

    /// Check if anyone holds `resource`
    pub fn is_claimed(&self, resource: Resource) -> bool {
        self.claims.contains_key(&resource)
    }

    /// Number of claims held by `owner`
    pub fn claimed_by(&self, owner: Owner) -> usize {
        self.claims.values().filter(|&&holder| holder == owner).count()
    }

    /// Total number of claims
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Check if nothing is claimed
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
