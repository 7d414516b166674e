//! In-memory doubles shared by the unit tests

use heapless::{Deque, Vec};
use tracewire_hal::Transport;

use crate::capture::buffer::RingWriter;
use crate::traits::sampler::{CapturePlan, Sampler};

/// Operator console captured by the tests
pub type Console = heapless::String<2048>;

/// Bytes a [`Pipe`] holds in each direction
pub const PIPE_DEPTH: usize = 4096;

/// Sampler that fills its whole budget with a counting pattern on each poll
pub struct Instant {
    pub running: bool,
    pub next: u8,
    pub starts: u32,
    /// Refuse to start
    pub fail: bool,
}

impl Instant {
    pub fn new() -> Self {
        Self {
            running: false,
            next: 0,
            starts: 0,
            fail: false,
        }
    }
}

impl Sampler for Instant {
    type Error = ();

    fn start(&mut self, _plan: &CapturePlan) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.running = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn deposit(&mut self, ring: &mut RingWriter<'_>) -> usize {
        if !self.running {
            return 0;
        }
        while ring.push(self.next) {
            self.next = self.next.wrapping_add(1);
        }
        ring.written()
    }
}

/// Transport with a fixed TX window refilled by `drain`
pub struct Pipe {
    pub connected: bool,
    pub rx: Deque<u8, 64>,
    pub tx: Vec<u8, PIPE_DEPTH>,
    pub window: usize,
    pub room: usize,
    pub flushes: usize,
}

impl Pipe {
    pub fn new(window: usize) -> Self {
        Self {
            connected: true,
            rx: Deque::new(),
            tx: Vec::new(),
            window,
            room: window,
            flushes: 0,
        }
    }

    pub fn host_sends(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.rx.push_back(byte).unwrap();
        }
    }

    /// Take everything written so far and reopen the window
    pub fn drain(&mut self) -> Vec<u8, PIPE_DEPTH> {
        self.room = self.window;
        core::mem::take(&mut self.tx)
    }
}

impl Transport for Pipe {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        while n < buf.len() {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            buf[n] = byte;
            n += 1;
        }
        n
    }

    fn write_available(&self) -> usize {
        self.room
    }

    fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.room);
        self.tx.extend_from_slice(&data[..n]).unwrap();
        self.room -= n;
        n
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
