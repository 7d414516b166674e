//! Follow-along logic analyzer mode
//!
//! Samples the eight I/O pins while other bus activity happens, and serves
//! the capture to a host viewer over its own transport sub-channel using
//! the `?`/`+` streaming protocol.
//!
//! The capture buffer is leased from the big-buffer pool for as long as the
//! mode is active. While active, the generic binary queues for the
//! sub-channel are switched off so nothing else writes into the stream.

use tracewire_hal::Transport;
use tracewire_protocol::CHANNEL_COUNT;

use super::context::ModeContext;
use super::resources::Resource;
use crate::capture::config::CaptureConfig;
use crate::capture::engine::CaptureEngine;
use crate::capture::geometry::BlockGeometry;
use crate::capture::session::StreamingSession;
use crate::config::FollowAlongConfig;
use crate::traits::mode::{Mode, ModeError};
use crate::traits::sampler::Sampler;

/// Display name
pub const FOLLOW_ALONG_NAME: &str = "Follow along logic analyzer";

/// Most samples drawn per graph row
pub const GRAPH_WIDTH: usize = 80;

const GRAPH_ROW_LEN: usize = GRAPH_WIDTH + 2;

/// Follow-along logic analyzer
pub struct FollowAlongMode<'m, T, S> {
    transport: T,
    sampler: S,
    geometry: BlockGeometry,
    config: FollowAlongConfig,
    engine: Option<CaptureEngine<'m>>,
    session: StreamingSession,
}

impl<'m, T: Transport, S: Sampler> FollowAlongMode<'m, T, S> {
    /// Mode streaming on `transport`, sampling through `sampler`
    pub fn new(transport: T, sampler: S) -> Self {
        Self {
            transport,
            sampler,
            geometry: BlockGeometry::default(),
            config: FollowAlongConfig::default(),
            engine: None,
            session: StreamingSession::new(),
        }
    }

    /// Use a different transfer block layout (the leased region must match)
    pub fn with_geometry(mut self, geometry: BlockGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Start from `config` instead of the defaults
    pub fn with_config(mut self, config: FollowAlongConfig) -> Self {
        self.config = config;
        self
    }

    /// Current settings
    pub fn config(&self) -> &FollowAlongConfig {
        &self.config
    }

    /// Change the oversampling factor used by the next capture
    pub fn set_oversample(&mut self, oversample: u32) {
        self.config.oversample = oversample;
    }

    /// Light the activity indicator on the next capture
    pub fn set_indicator(&mut self, enabled: bool) {
        self.config.indicator = enabled;
    }

    /// Capture engine, present while the mode is active
    pub fn engine(&self) -> Option<&CaptureEngine<'m>> {
        self.engine.as_ref()
    }

    /// Check if setup succeeded and cleanup has not run
    pub fn is_active(&self) -> bool {
        self.engine.is_some()
    }

    /// Streaming session state
    pub fn session(&self) -> &StreamingSession {
        &self.session
    }

    /// Host transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Host transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Sample source
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    fn claims(&self) -> [Resource; 2] {
        [
            Resource::SampleClock,
            Resource::TransportChannel(self.config.channel),
        ]
    }

    fn release_claims(&self, ctx: &mut ModeContext<'_, 'm>) {
        for resource in self.claims() {
            ctx.release(resource);
        }
    }

    /// Undo the claims and queue switch of a failed setup
    fn rollback(&self, ctx: &mut ModeContext<'_, 'm>) {
        ctx.queues.set_enabled(self.config.channel, true);
        self.release_claims(ctx);
    }

    fn print_graph(engine: &CaptureEngine<'m>, ctx: &mut ModeContext<'_, 'm>) {
        let width = (engine.get_ptr() as usize).min(GRAPH_WIDTH);
        for bit in 0..CHANNEL_COUNT {
            let mut row: heapless::String<GRAPH_ROW_LEN> = heapless::String::new();
            for offset in 0..width {
                let high = engine.read_at(offset) & (1 << bit) != 0;
                let _ = row.push(if high { '-' } else { '_' });
            }
            let _ = row.push_str("\r\n");
            ctx.print(format_args!("{}", row));
        }
    }
}

impl<'m, T: Transport, S: Sampler> Mode<'m> for FollowAlongMode<'m, T, S> {
    fn name(&self) -> &'static str {
        FOLLOW_ALONG_NAME
    }

    fn setup(&mut self, ctx: &mut ModeContext<'_, 'm>) -> Result<(), ModeError> {
        if self.engine.is_some() {
            return Ok(());
        }

        for resource in self.claims() {
            if let Err(err) = ctx.claim(resource) {
                self.release_claims(ctx);
                return Err(err);
            }
        }
        ctx.queues.set_enabled(self.config.channel, false);

        let region = match ctx.lease_memory() {
            Ok(region) => region,
            Err(err) => {
                ctx.print(format_args!("Logic analyzer setup error, out of memory?\r\n"));
                self.rollback(ctx);
                return Err(err);
            }
        };

        // Checked up front: a rejected region could not be handed back
        if region.len() != self.geometry.capacity() {
            error!(
                "Big buffer is {} bytes, capture needs {}",
                region.len(),
                self.geometry.capacity()
            );
            ctx.return_memory(region);
            ctx.print(format_args!("Logic analyzer setup error, out of memory?\r\n"));
            self.rollback(ctx);
            return Err(ModeError::BufferGeometry);
        }

        let engine = match CaptureEngine::new(region, self.geometry) {
            Ok(engine) => engine,
            Err(err) => {
                error!("Capture buffer rejected: {}", err);
                self.rollback(ctx);
                return Err(ModeError::BufferGeometry);
            }
        };

        self.engine = Some(engine);
        self.session = StreamingSession::new();
        info!(
            "Follow-along analyzer ready, {} samples",
            self.geometry.capacity()
        );
        Ok(())
    }

    fn service(&mut self, _ctx: &mut ModeContext<'_, 'm>) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.poll(&mut self.sampler);
        self.session.service(engine, &mut self.transport);
    }

    fn cleanup(&mut self, ctx: &mut ModeContext<'_, 'm>) {
        self.session.abandon();
        if let Some(mut engine) = self.engine.take() {
            engine.stop(&mut self.sampler);
            ctx.return_memory(engine.into_storage());
        }
        self.release_claims(ctx);
        ctx.queues.set_enabled(self.config.channel, true);
    }

    fn configure(&mut self, ctx: &mut ModeContext<'_, 'm>, frequency_hz: u32) {
        self.config.frequency_hz = frequency_hz;
        ctx.print(format_args!(
            "\r\nFollow Along Logic Analyzer capture: {}Hz ({}x oversampling)\r\n",
            self.config.sample_rate_hz(),
            self.config.oversample
        ));
        ctx.print(format_args!(
            "Use the 'logic' command to change capture settings.\r\n"
        ));
    }

    fn start(&mut self, ctx: &mut ModeContext<'_, 'm>) {
        let Some(engine) = self.engine.as_mut() else {
            warn!("Follow-along start without setup");
            return;
        };

        self.session.abandon();
        if engine.is_busy() {
            engine.stop(&mut self.sampler);
        }

        let capture = CaptureConfig::new(self.config.frequency_hz, engine.capacity() as u32)
            .with_oversampling(self.config.oversample);
        if let Err(err) = engine.configure(capture) {
            warn!("Follow-along capture rejected: {}", err);
            ctx.print(format_args!("Logic analyzer capture rejected: {}\r\n", err));
            return;
        }

        let requested = capture.sample_rate_hz();
        let effective = engine.effective_rate_hz();
        if effective < requested {
            warn!("Sampling clock limited to {} Hz", effective);
            ctx.print(format_args!(
                "Logic analyzer sampling clock limited to {}Hz\r\n",
                effective
            ));
        }

        if let Err(err) = engine.arm(&mut self.sampler, self.config.indicator) {
            warn!("Follow-along arm failed: {}", err);
            ctx.print(format_args!("Logic analyzer failed to start: {}\r\n", err));
        }
    }

    fn stop(&mut self, _ctx: &mut ModeContext<'_, 'm>) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop(&mut self.sampler);
        }
    }

    fn report(&mut self, ctx: &mut ModeContext<'_, 'm>) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if self.session.is_dumping() {
            // Status text or a cursor reset would corrupt the binary stream
            ctx.print(format_args!("Logic Analyzer: dump in progress\r\n"));
            return;
        }

        self.session.notify(engine, &mut self.transport);
        engine.reset_read_ptr();
        ctx.print(format_args!(
            "Logic Analyzer: {} samples captured\r\n",
            engine.get_ptr()
        ));
        ctx.print(format_args!("Logic Analyzer Graph:\r\n"));
        Self::print_graph(engine, ctx);
    }
}
