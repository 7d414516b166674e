//! `embedded-io` transport adapter
//!
//! Puts any non-blocking `embedded-io` byte stream (a USB CDC class, a
//! UART) behind [`Transport`]. Writes are staged in a local buffer so free
//! space can be reported without touching the device; `flush` moves staged
//! bytes out as far as the device accepts them. The stream's own `flush`
//! blocks until the bytes are on the wire, so it is never called here.

use embedded_io::{Read, ReadReady, Write, WriteReady};
use heapless::{Deque, Vec};
use tracewire_hal::Transport;
use tracewire_protocol::CHUNK_SIZE;

/// Default size of each staging buffer: two protocol packets
pub const IO_BUFFER: usize = CHUNK_SIZE * 2;

/// [`Transport`] over an `embedded-io` stream
pub struct IoTransport<IO, const RX: usize = IO_BUFFER, const TX: usize = IO_BUFFER> {
    io: IO,
    rx: Deque<u8, RX>,
    tx: Vec<u8, TX>,
    connected: bool,
    errors: u32,
}

impl<IO, const RX: usize, const TX: usize> IoTransport<IO, RX, TX>
where
    IO: Read + ReadReady + Write + WriteReady,
{
    /// Wrap `io`, initially connected
    pub fn new(io: IO) -> Self {
        Self {
            io,
            rx: Deque::new(),
            tx: Vec::new(),
            connected: true,
            errors: 0,
        }
    }

    /// Record whether a host is attached (e.g. from the DTR line)
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if !connected {
            self.tx.clear();
        }
    }

    /// Pull whatever the device has received into the RX buffer
    pub fn poll(&mut self) {
        let mut buf = [0u8; CHUNK_SIZE];
        while !self.rx.is_full() {
            match self.io.read_ready() {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => {
                    self.fault();
                    break;
                }
            }
            let want = (RX - self.rx.len()).min(buf.len());
            match self.io.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => {
                    for &byte in &buf[..n] {
                        // Room was checked above
                        let _ = self.rx.push_back(byte);
                    }
                }
                Err(_) => {
                    self.fault();
                    break;
                }
            }
        }
    }

    /// I/O errors seen so far
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Wrapped stream
    pub fn inner(&self) -> &IO {
        &self.io
    }

    /// Wrapped stream, mutably
    pub fn inner_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Take the stream back, dropping anything staged
    pub fn into_inner(self) -> IO {
        self.io
    }

    fn fault(&mut self) {
        self.errors = self.errors.saturating_add(1);
        warn!("Transport I/O error");
    }
}

impl<IO, const RX: usize, const TX: usize> Transport for IoTransport<IO, RX, TX>
where
    IO: Read + ReadReady + Write + WriteReady,
{
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        if self.rx.is_empty() {
            self.poll();
        }
        let mut count = 0;
        for slot in buf.iter_mut() {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            *slot = byte;
            count += 1;
        }
        count
    }

    fn write_available(&self) -> usize {
        TX - self.tx.len()
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.write_available());
        // Bounded by the free space just computed
        let _ = self.tx.extend_from_slice(&data[..count]);
        count
    }

    fn flush(&mut self) {
        while !self.tx.is_empty() {
            match self.io.write_ready() {
                Ok(true) => {}
                Ok(false) => return,
                Err(_) => {
                    self.fault();
                    return;
                }
            }
            match self.io.write(&self.tx) {
                Ok(0) => return,
                Ok(n) => {
                    let len = self.tx.len();
                    self.tx.copy_within(n..len, 0);
                    self.tx.truncate(len - n);
                }
                Err(_) => {
                    self.fault();
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;
    use heapless::{Deque, Vec as Wired};

    /// Stream that accepts at most `accept` bytes per write
    struct Wire {
        incoming: Deque<u8, 16>,
        outgoing: Wired<u8, 64>,
        accept: usize,
        ready: bool,
        flushed: u32,
    }

    impl Wire {
        fn new(accept: usize) -> Self {
            Self {
                incoming: Deque::new(),
                outgoing: Wired::new(),
                accept,
                ready: true,
                flushed: 0,
            }
        }
    }

    impl ErrorType for Wire {
        type Error = Infallible;
    }

    impl Read for Wire {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let mut n = 0;
            while n < buf.len() {
                let Some(byte) = self.incoming.pop_front() else {
                    break;
                };
                buf[n] = byte;
                n += 1;
            }
            Ok(n)
        }
    }

    impl ReadReady for Wire {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.incoming.is_empty())
        }
    }

    impl Write for Wire {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            let n = buf.len().min(self.accept);
            self.outgoing.extend_from_slice(&buf[..n]).unwrap();
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            self.flushed += 1;
            Ok(())
        }
    }

    impl WriteReady for Wire {
        fn write_ready(&mut self) -> Result<bool, Infallible> {
            Ok(self.ready)
        }
    }

    #[test]
    fn test_reads_through() {
        let mut wire = Wire::new(64);
        wire.incoming.push_back(b'?').unwrap();
        wire.incoming.push_back(b'+').unwrap();
        let mut transport: IoTransport<Wire> = IoTransport::new(wire);

        assert_eq!(transport.read_byte(), Some(b'?'));
        assert_eq!(transport.read_available(), 1);
        assert_eq!(transport.read_byte(), Some(b'+'));
        assert_eq!(transport.read_byte(), None);
    }

    #[test]
    fn test_flush_drains_in_pieces() {
        let mut transport: IoTransport<Wire> = IoTransport::new(Wire::new(5));

        assert_eq!(transport.write_available(), IO_BUFFER);
        assert_eq!(transport.write(b"$FALADATA;8;"), 12);
        transport.flush();

        assert_eq!(transport.inner().outgoing, b"$FALADATA;8;");
        // Blocking device flush is never issued from the service loop
        assert_eq!(transport.inner().flushed, 0);
        assert_eq!(transport.write_available(), IO_BUFFER);
    }

    #[test]
    fn test_flush_waits_for_device() {
        let mut wire = Wire::new(64);
        wire.ready = false;
        let mut transport: IoTransport<Wire, 8, 8> = IoTransport::new(wire);

        assert_eq!(transport.write(b"0123456789"), 8);
        transport.flush();
        assert!(transport.inner().outgoing.is_empty());
        assert_eq!(transport.write_available(), 0);

        transport.inner_mut().ready = true;
        transport.flush();
        assert_eq!(transport.inner().outgoing, b"01234567");
    }

    #[test]
    fn test_disconnect_drops_staged() {
        let mut transport: IoTransport<Wire> = IoTransport::new(Wire::new(64));
        transport.write(b"abc");
        transport.set_connected(false);
        assert!(!transport.is_connected());
        assert_eq!(transport.write_available(), IO_BUFFER);
        assert_eq!(transport.errors(), 0);
    }
}
