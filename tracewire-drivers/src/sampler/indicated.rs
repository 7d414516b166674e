//! Sampler wrapper that drives the capture activity indicator

use tracewire_core::capture::buffer::RingWriter;
use tracewire_core::traits::{CapturePlan, Sampler};
use tracewire_hal::Indicator;

/// Lights `indicator` while the wrapped sampler runs, if the plan asks for it
pub struct IndicatedSampler<S, I> {
    inner: S,
    indicator: I,
}

impl<S: Sampler, I: Indicator> IndicatedSampler<S, I> {
    /// Wrap `inner`
    pub fn new(inner: S, indicator: I) -> Self {
        Self { inner, indicator }
    }

    /// Wrapped sampler
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The indicator
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Take the parts back
    pub fn into_parts(self) -> (S, I) {
        (self.inner, self.indicator)
    }
}

impl<S: Sampler, I: Indicator> Sampler for IndicatedSampler<S, I> {
    type Error = S::Error;

    fn start(&mut self, plan: &CapturePlan) -> Result<(), S::Error> {
        self.indicator.set_active(plan.indicator);
        let result = self.inner.start(plan);
        if result.is_err() {
            self.indicator.set_active(false);
        }
        result
    }

    fn stop(&mut self) {
        self.inner.stop();
        self.indicator.set_active(false);
    }

    fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    fn deposit(&mut self, ring: &mut RingWriter<'_>) -> usize {
        self.inner.deposit(ring)
    }
}
