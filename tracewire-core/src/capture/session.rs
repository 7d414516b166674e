//! Host streaming session
//!
//! Answers single-byte host commands on the logic analyzer's transport
//! sub-channel:
//!
//! - `?` sends a `$FALADATA` status frame
//! - `+` streams every available sample, newest first
//!
//! A dump is resumable: each service tick sends as many full chunks as the
//! transport has room for and then returns. While a dump is in flight no
//! further command bytes are consumed, so the host sees exactly the byte
//! stream a blocking dump would have produced.

use tracewire_hal::Transport;
use tracewire_protocol::{HostCommand, StatusFrame, CHUNK_SIZE};

use super::engine::CaptureEngine;

/// Most command bytes consumed in one service tick
pub const RX_BUF_SIZE: usize = 64;

/// Streaming protocol state for one transport
#[derive(Debug, Default)]
pub struct StreamingSession {
    /// Bytes of the current dump still to send
    dump_remaining: u32,
}

impl StreamingSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self { dump_remaining: 0 }
    }

    /// Check if a dump is in flight
    pub fn is_dumping(&self) -> bool {
        self.dump_remaining > 0
    }

    /// Bytes of the current dump still to send
    pub fn dump_remaining(&self) -> u32 {
        self.dump_remaining
    }

    /// Drop any in-flight dump
    pub fn abandon(&mut self) {
        if self.dump_remaining > 0 {
            warn!("Dump abandoned with {} bytes unsent", self.dump_remaining);
        }
        self.dump_remaining = 0;
    }

    /// One cooperative tick
    ///
    /// Continues an in-flight dump, or else handles up to [`RX_BUF_SIZE`]
    /// received command bytes. Unknown bytes are ignored.
    pub fn service<T: Transport>(&mut self, engine: &mut CaptureEngine<'_>, transport: &mut T) {
        if !transport.is_connected() {
            self.abandon();
            return;
        }

        if self.is_dumping() {
            self.pump(engine, transport);
            return;
        }

        for _ in 0..RX_BUF_SIZE {
            let Some(byte) = transport.read_byte() else {
                break;
            };
            match HostCommand::from_byte(byte) {
                Some(HostCommand::Status) => {
                    self.notify(engine, transport);
                }
                Some(HostCommand::Dump) => {
                    self.begin_dump(engine);
                    self.pump(engine, transport);
                    if self.is_dumping() {
                        // Remaining command bytes wait until the dump is out
                        break;
                    }
                }
                None => {}
            }
        }
    }

    /// Send a status frame for the current capture
    ///
    /// The frame is dropped when the transport is disconnected or lacks room
    /// for a full packet. Returns `true` if it was sent.
    pub fn notify<T: Transport>(
        &mut self,
        engine: &mut CaptureEngine<'_>,
        transport: &mut T,
    ) -> bool {
        if !transport.is_connected() {
            return false;
        }
        engine.reset_read_ptr();
        let frame = status_frame(engine);

        let mut packet = [0u8; CHUNK_SIZE];
        let Ok(len) = frame.encode_into(&mut packet) else {
            return false;
        };
        if transport.write_available() < CHUNK_SIZE
            || !transport.write_all_if_room(&packet[..len])
        {
            warn!("Status frame dropped, transport full");
            return false;
        }
        debug!("Status sent: {} samples", frame.samples);
        true
    }

    /// Budget a dump of every available sample
    pub fn begin_dump(&mut self, engine: &mut CaptureEngine<'_>) {
        engine.reset_read_ptr();
        self.dump_remaining = engine.get_ptr();
        info!("Dump of {} samples started", self.dump_remaining);
    }

    /// Send chunks while the transport has room for a full one
    fn pump<T: Transport>(&mut self, engine: &mut CaptureEngine<'_>, transport: &mut T) {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.dump_remaining > 0 && transport.write_available() >= CHUNK_SIZE {
            let len = engine.dump_next(&mut chunk, &mut self.dump_remaining);
            if len == 0 {
                // Read side was reset under us (re-armed mid-dump)
                warn!("Dump cut short, {} bytes unsent", self.dump_remaining);
                self.dump_remaining = 0;
                break;
            }
            transport.write(&chunk[..len]);
            transport.flush();
        }
        if self.dump_remaining == 0 {
            info!("Dump complete");
        }
    }
}

/// Status frame describing the engine's current capture
///
/// The sample count is read from the current read cursor; call
/// [`CaptureEngine::reset_read_ptr`] first for the full count.
pub fn status_frame(engine: &CaptureEngine<'_>) -> StatusFrame {
    let config = engine.config();
    StatusFrame {
        trigger_pin: config.trigger.pin(),
        trigger_mask: config.trigger.mask,
        edge: config.trigger.edge_flag(),
        pre_trigger: engine.trigger_hit().map(|hit| hit.pre_trigger).unwrap_or(0),
        ..StatusFrame::untriggered(config.sample_rate_hz(), engine.get_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::config::CaptureConfig;
    use crate::capture::geometry::BlockGeometry;
    use crate::testing::{Instant, Pipe, PIPE_DEPTH};
    use heapless::Vec;

    const CAP: usize = 256;

    fn captured(storage: &mut [u8], total: u32) -> CaptureEngine<'_> {
        let geometry = BlockGeometry::new(64, 4).unwrap();
        let mut engine = CaptureEngine::new(storage, geometry).unwrap();
        let mut sampler = Instant::new();
        engine.configure(CaptureConfig::new(1_000_000, total)).unwrap();
        engine.arm(&mut sampler, false).unwrap();
        engine.poll(&mut sampler);
        assert!(engine.is_done());
        engine
    }

    #[test]
    fn test_status_query() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 200);
        let mut pipe = Pipe::new(1024);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"?");
        session.service(&mut engine, &mut pipe);

        assert_eq!(pipe.drain(), b"$FALADATA;8;0;0;N;8000000;200;0;\n");
    }

    #[test]
    fn test_noise_ignored() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 10);
        let mut pipe = Pipe::new(1024);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"abc\r\n");
        session.service(&mut engine, &mut pipe);

        assert!(pipe.drain().is_empty());
        assert_eq!(pipe.read_available(), 0);
    }

    #[test]
    fn test_full_dump_newest_first() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 200);
        let mut pipe = Pipe::new(4096);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"+");
        session.service(&mut engine, &mut pipe);

        let bytes = pipe.drain();
        assert_eq!(bytes.len(), 200);
        assert!(bytes.iter().rev().map(|&b| b as u32).eq(0..200));
        assert!(!session.is_dumping());
        // 200 bytes = 3 full chunks + 1 partial, one flush each
        assert_eq!(pipe.flushes, 4);
    }

    #[test]
    fn test_dump_resumes_across_ticks() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 200);
        // Room for one chunk per tick
        let mut pipe = Pipe::new(CHUNK_SIZE);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"+?");
        session.service(&mut engine, &mut pipe);
        assert!(session.is_dumping());
        assert_eq!(session.dump_remaining(), 200 - CHUNK_SIZE as u32);

        let mut received: Vec<u8, PIPE_DEPTH> = pipe.drain();
        while session.is_dumping() {
            session.service(&mut engine, &mut pipe);
            received.extend_from_slice(&pipe.drain()).unwrap();
        }
        assert_eq!(received.len(), 200);
        assert_eq!(received[0], 199);
        assert_eq!(received[199], 0);

        // The queued '?' is answered only after the dump
        assert_eq!(pipe.read_available(), 1);
        session.service(&mut engine, &mut pipe);
        assert_eq!(pipe.drain(), b"$FALADATA;8;0;0;N;8000000;200;0;\n");
    }

    #[test]
    fn test_backpressure_defers() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 50);
        let mut pipe = Pipe::new(CHUNK_SIZE - 1);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"+");
        session.service(&mut engine, &mut pipe);
        assert!(pipe.drain().is_empty());
        assert_eq!(session.dump_remaining(), 50);

        pipe.window = CHUNK_SIZE;
        pipe.drain();
        session.service(&mut engine, &mut pipe);
        assert_eq!(pipe.drain().len(), 50);
        assert!(!session.is_dumping());
    }

    #[test]
    fn test_status_dropped_without_room() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 50);
        let mut pipe = Pipe::new(16);
        let mut session = StreamingSession::new();

        assert!(!session.notify(&mut engine, &mut pipe));
        assert!(pipe.drain().is_empty());

        // Room for the frame itself is not enough, a whole packet must be free
        pipe.window = CHUNK_SIZE - 1;
        pipe.drain();
        assert!(!session.notify(&mut engine, &mut pipe));
        assert!(pipe.drain().is_empty());

        pipe.window = CHUNK_SIZE;
        pipe.drain();
        assert!(session.notify(&mut engine, &mut pipe));
        assert_eq!(pipe.flushes, 1);
    }

    #[test]
    fn test_disconnect_abandons_dump() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 200);
        let mut pipe = Pipe::new(CHUNK_SIZE);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"+");
        session.service(&mut engine, &mut pipe);
        assert!(session.is_dumping());

        pipe.connected = false;
        session.service(&mut engine, &mut pipe);
        assert!(!session.is_dumping());
    }

    #[test]
    fn test_status_is_idempotent() {
        let mut storage = [0u8; CAP];
        let mut engine = captured(&mut storage, 120);
        let mut pipe = Pipe::new(4096);
        let mut session = StreamingSession::new();

        pipe.host_sends(b"+");
        session.service(&mut engine, &mut pipe);
        let first = pipe.drain();

        pipe.host_sends(b"???");
        session.service(&mut engine, &mut pipe);
        let frames = pipe.drain();
        assert_eq!(frames.iter().filter(|&&b| b == b'\n').count(), 3);

        pipe.host_sends(b"+");
        session.service(&mut engine, &mut pipe);
        assert_eq!(pipe.drain(), first);
    }

    #[test]
    fn test_status_reports_trigger() {
        use crate::capture::trigger::TriggerConfig;

        let mut storage = [0u8; CAP];
        let geometry = BlockGeometry::new(64, 4).unwrap();
        let mut engine = CaptureEngine::new(&mut storage, geometry).unwrap();
        let mut sampler = Instant::new();
        let config = CaptureConfig::new(1_000_000, 100)
            .with_trigger(TriggerConfig::edge(0b0010_0000, 0b0010_0000));
        engine.configure(config).unwrap();
        engine.arm(&mut sampler, false).unwrap();
        engine.poll(&mut sampler);

        engine.reset_read_ptr();
        let frame = status_frame(&engine);
        assert_eq!(frame.trigger_pin, 5);
        assert_eq!(frame.trigger_mask, 0x20);
        assert_eq!(frame.edge.as_char(), 'R');
        assert_eq!(frame.pre_trigger, 32);
    }
}
