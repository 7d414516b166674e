//! Host → device command bytes

/// Status query byte
pub const CMD_STATUS: u8 = b'?';

/// Bulk dump request byte
pub const CMD_DUMP: u8 = b'+';

/// Commands the host can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Send a `$FALADATA` status frame
    Status,
    /// Stream every available sample, most recent first
    Dump,
}

impl HostCommand {
    /// Decode a command byte
    ///
    /// Unknown bytes are protocol noise and decode to `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_STATUS => Some(Self::Status),
            CMD_DUMP => Some(Self::Dump),
            _ => None,
        }
    }
}
