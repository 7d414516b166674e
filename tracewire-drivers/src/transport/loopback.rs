//! In-memory loopback transport
//!
//! A [`Loopback`] holds both directions of a link. [`Loopback::split`] hands
//! out a [`DevicePort`], which implements [`Transport`] for the firmware
//! side, and a [`HostPort`] that plays the host viewer. Both borrow the same
//! buffers, so a test can keep talking to a port whose device end is owned
//! by a mode.

use core::cell::RefCell;

use heapless::Deque;
use tracewire_hal::Transport;

struct Link<const N: usize> {
    to_device: Deque<u8, N>,
    to_host: Deque<u8, N>,
    connected: bool,
    /// Extra cap on advertised TX space, to simulate a slow host
    tx_window: usize,
    flushes: u32,
}

/// Both directions of an in-memory link, `N` bytes buffered each way
pub struct Loopback<const N: usize> {
    link: RefCell<Link<N>>,
}

impl<const N: usize> Default for Loopback<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Loopback<N> {
    /// Connected link with empty buffers
    pub fn new() -> Self {
        Self {
            link: RefCell::new(Link {
                to_device: Deque::new(),
                to_host: Deque::new(),
                connected: true,
                tx_window: usize::MAX,
                flushes: 0,
            }),
        }
    }

    /// Device and host ends of the link
    pub fn split(&self) -> (DevicePort<'_, N>, HostPort<'_, N>) {
        (DevicePort { link: &self.link }, HostPort { link: &self.link })
    }
}

/// Firmware end of a [`Loopback`]
pub struct DevicePort<'a, const N: usize> {
    link: &'a RefCell<Link<N>>,
}

impl<const N: usize> Transport for DevicePort<'_, N> {
    fn is_connected(&self) -> bool {
        self.link.borrow().connected
    }

    fn read_available(&self) -> usize {
        self.link.borrow().to_device.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut link = self.link.borrow_mut();
        let mut count = 0;
        for slot in buf.iter_mut() {
            let Some(byte) = link.to_device.pop_front() else {
                break;
            };
            *slot = byte;
            count += 1;
        }
        count
    }

    fn write_available(&self) -> usize {
        let link = self.link.borrow();
        (N - link.to_host.len()).min(link.tx_window)
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let room = self.write_available();
        let mut link = self.link.borrow_mut();
        let mut count = 0;
        for &byte in data.iter().take(room) {
            if link.to_host.push_back(byte).is_err() {
                break;
            }
            count += 1;
        }
        if link.tx_window != usize::MAX {
            link.tx_window -= count;
        }
        count
    }

    fn flush(&mut self) {
        self.link.borrow_mut().flushes += 1;
    }
}

/// Host end of a [`Loopback`]
pub struct HostPort<'a, const N: usize> {
    link: &'a RefCell<Link<N>>,
}

impl<const N: usize> HostPort<'_, N> {
    /// Send bytes to the device; returns how many fit
    pub fn send(&self, data: &[u8]) -> usize {
        let mut link = self.link.borrow_mut();
        let mut count = 0;
        for &byte in data {
            if link.to_device.push_back(byte).is_err() {
                break;
            }
            count += 1;
        }
        count
    }

    /// Receive up to `buf.len()` bytes from the device
    pub fn receive(&self, buf: &mut [u8]) -> usize {
        let mut link = self.link.borrow_mut();
        let mut count = 0;
        for slot in buf.iter_mut() {
            let Some(byte) = link.to_host.pop_front() else {
                break;
            };
            *slot = byte;
            count += 1;
        }
        count
    }

    /// Move everything the device sent into `sink`
    pub fn receive_into<E: Extend<u8>>(&self, sink: &mut E) -> usize {
        let mut link = self.link.borrow_mut();
        let count = link.to_host.len();
        sink.extend(core::iter::from_fn(|| link.to_host.pop_front()));
        count
    }

    /// Bytes waiting for the host
    pub fn pending(&self) -> usize {
        self.link.borrow().to_host.len()
    }

    /// Attach or detach the host
    pub fn set_connected(&self, connected: bool) {
        self.link.borrow_mut().connected = connected;
    }

    /// Limit how many more bytes the device may send, `None` for no limit
    pub fn set_window(&self, window: Option<usize>) {
        self.link.borrow_mut().tx_window = window.unwrap_or(usize::MAX);
    }

    /// Number of device flushes so far
    pub fn flushes(&self) -> u32 {
        self.link.borrow().flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;
    use proptest::prelude::*;

    #[test]
    fn test_both_directions() {
        let link: Loopback<16> = Loopback::new();
        let (mut device, host) = link.split();

        assert_eq!(host.send(b"?+"), 2);
        assert_eq!(device.read_available(), 2);
        assert_eq!(device.read_byte(), Some(b'?'));
        assert_eq!(device.read_byte(), Some(b'+'));
        assert_eq!(device.read_byte(), None);

        assert!(device.write_all_if_room(b"ok\n"));
        assert_eq!(host.flushes(), 1);
        let mut buf = [0u8; 8];
        assert_eq!(host.receive(&mut buf), 3);
        assert_eq!(&buf[..3], b"ok\n");
    }

    #[test]
    fn test_full_buffers() {
        let link: Loopback<4> = Loopback::new();
        let (mut device, host) = link.split();

        assert_eq!(host.send(b"abcdef"), 4);
        assert_eq!(device.write(b"123456"), 4);
        assert_eq!(device.write_available(), 0);
        assert!(!device.write_all_if_room(b"x"));
    }

    #[test]
    fn test_window_limits_space() {
        let link: Loopback<128> = Loopback::new();
        let (mut device, host) = link.split();

        host.set_window(Some(10));
        assert_eq!(device.write_available(), 10);
        assert_eq!(device.write(&[0u8; 64]), 10);
        assert_eq!(device.write_available(), 0);

        host.set_window(None);
        assert_eq!(device.write_available(), 118);
    }

    #[test]
    fn test_disconnect() {
        let link: Loopback<8> = Loopback::new();
        let (device, host) = link.split();

        host.set_connected(false);
        assert!(!device.is_connected());
    }

    proptest! {
        #[test]
        fn prop_stream_survives_chunking(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            chunk in 1usize..100,
        ) {
            let link: Loopback<64> = Loopback::new();
            let (mut device, host) = link.split();
            let mut received: Vec<u8, 512> = Vec::new();

            let mut sent = 0;
            while sent < data.len() {
                let end = (sent + chunk).min(data.len());
                sent += device.write(&data[sent..end]);
                host.receive_into(&mut received);
            }
            prop_assert_eq!(received.as_slice(), data.as_slice());
        }
    }
}
