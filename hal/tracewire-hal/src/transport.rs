//! Byte-stream transport abstraction
//!
//! Models one sub-channel of a USB CDC style link: non-blocking reads,
//! writes that must be size-checked against [`Transport::write_available`]
//! before they are issued, and an explicit flush.

/// Non-blocking duplex byte stream
pub trait Transport {
    /// Whether a host is attached to this channel
    fn is_connected(&self) -> bool;

    /// Number of received bytes waiting to be read
    fn read_available(&self) -> usize;

    /// Read up to `buf.len()` bytes without blocking
    ///
    /// Returns the number of bytes copied into `buf` (possibly zero).
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Free space in the transmit buffer, in bytes
    fn write_available(&self) -> usize;

    /// Queue bytes for transmission without blocking
    ///
    /// Returns the number of bytes accepted. Callers are expected to check
    /// [`write_available`](Transport::write_available) first so that the
    /// whole slice is accepted.
    fn write(&mut self, data: &[u8]) -> usize;

    /// Push queued bytes towards the host
    fn flush(&mut self);

    /// Read a single byte, if one is waiting
    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        if self.read(&mut buf) == 1 {
            Some(buf[0])
        } else {
            None
        }
    }

    /// Write `data` only if the whole slice fits right now
    ///
    /// Returns `true` if the bytes were queued and flushed.
    fn write_all_if_room(&mut self, data: &[u8]) -> bool {
        if self.write_available() < data.len() {
            return false;
        }
        let written = self.write(data);
        self.flush();
        written == data.len()
    }
}
