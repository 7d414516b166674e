//! Big-buffer memory pool
//!
//! One large RAM region shared by every mode that needs bulk storage. At most
//! one owner holds it at a time; the region itself is handed out as a
//! mutable slice and must be given back on cleanup.

use super::resources::Owner;

/// Memory lease errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryError {
    /// The region is leased to `owner`
    InUse { owner: Owner },
    /// The region was never given back
    Missing,
}

/// The shared region and its current lease
pub struct BigBuffer<'m> {
    region: Option<&'m mut [u8]>,
    len: usize,
    owner: Option<Owner>,
}

impl<'m> BigBuffer<'m> {
    /// Manage `region` as the shared pool
    pub fn new(region: &'m mut [u8]) -> Self {
        let len = region.len();
        Self {
            region: Some(region),
            len,
            owner: None,
        }
    }

    /// Size of the region in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the region is zero-sized
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current lease holder
    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    /// Check if the region is available
    pub fn is_free(&self) -> bool {
        self.owner.is_none() && self.region.is_some()
    }

    /// Lease the whole region to `owner`
    pub fn claim(&mut self, owner: Owner) -> Result<&'m mut [u8], MemoryError> {
        if let Some(holder) = self.owner {
            return Err(MemoryError::InUse { owner: holder });
        }
        let region = self.region.take().ok_or(MemoryError::Missing)?;
        self.owner = Some(owner);
        debug!("Big buffer leased to mode {}", owner);
        Ok(region)
    }

    /// End the lease and take the region back
    pub fn release(&mut self, region: &'m mut [u8]) {
        if region.len() != self.len {
            warn!(
                "Big buffer returned with {} bytes, expected {}",
                region.len(),
                self.len
            );
        }
        self.len = region.len();
        self.region = Some(region);
        self.owner = None;
    }
}
