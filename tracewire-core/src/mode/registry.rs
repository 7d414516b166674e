//! Mode registry and dispatcher
//!
//! Holds the static table of personalities and guarantees that at most one
//! of them is active. Switching runs the outgoing mode's cleanup to
//! completion before the incoming mode's setup, then checks that every
//! claim the outgoing mode made was released.

use core::fmt::{self, Write as _};

use super::context::{ModeContext, SharedResources};
use super::resources::Owner;
use crate::config::{ModeSelector, SelectorOutOfRange};
use crate::traits::mode::{Mode, ModeError};

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Selector does not index the mode table
    InvalidSelection { index: usize, count: usize },
    /// The selected mode failed to set up
    Setup(ModeError),
}

impl From<SelectorOutOfRange> for RegistryError {
    fn from(err: SelectorOutOfRange) -> Self {
        RegistryError::InvalidSelection {
            index: err.index,
            count: err.count,
        }
    }
}

impl From<ModeError> for RegistryError {
    fn from(err: ModeError) -> Self {
        RegistryError::Setup(err)
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidSelection { index, count } => {
                write!(f, "no mode {} (0..{})", index, count)
            }
            RegistryError::Setup(err) => write!(f, "setup failed: {}", err),
        }
    }
}

/// Static mode table plus selection state
pub struct ModeRegistry<'r, 'm, const N: usize> {
    modes: [&'r mut dyn Mode<'m>; N],
    selected: ModeSelector,
    active: Option<Owner>,
}

impl<'r, 'm, const N: usize> ModeRegistry<'r, 'm, N> {
    /// Registry over `modes`; the first entry is selected, none is active
    pub fn new(modes: [&'r mut dyn Mode<'m>; N]) -> Self {
        Self {
            modes,
            selected: ModeSelector::FIRST,
            active: None,
        }
    }

    /// Number of modes in the table
    pub fn len(&self) -> usize {
        N
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        N == 0
    }

    /// Display name of mode `index`
    pub fn name(&self, index: usize) -> Option<&'static str> {
        self.modes.get(index).map(|mode| mode.name())
    }

    /// Display names in table order, for the mode menu
    pub fn names(&self) -> [&'static str; N] {
        core::array::from_fn(|index| self.modes[index].name())
    }

    /// Mode chosen by the operator
    pub fn selected(&self) -> ModeSelector {
        self.selected
    }

    /// Mode whose setup last succeeded, if any
    pub fn active(&self) -> Option<Owner> {
        self.active
    }

    /// Name of the active mode
    pub fn active_name(&self) -> Option<&'static str> {
        self.active.and_then(|index| self.name(index))
    }

    /// Choose the mode the next [`setup`](Self::setup) activates
    ///
    /// Only records the choice; nothing is torn down or set up.
    pub fn select(&mut self, index: usize) -> Result<(), RegistryError> {
        self.selected = ModeSelector::new(index, N)?;
        Ok(())
    }

    /// Select mode `index` and set it up
    pub fn activate(
        &mut self,
        index: usize,
        shared: &mut SharedResources<'m>,
        console: &mut dyn fmt::Write,
    ) -> Result<(), RegistryError> {
        self.select(index)?;
        self.setup(shared, console)?;
        Ok(())
    }

    /// Make the selected mode the active one
    ///
    /// Cleans up the currently active mode first. Does nothing if the
    /// selected mode is already active. On failure no mode is active and any
    /// claims the failed setup left behind are released.
    pub fn setup(
        &mut self,
        shared: &mut SharedResources<'m>,
        console: &mut dyn fmt::Write,
    ) -> Result<(), ModeError> {
        let target = self.selected.index();
        if self.active == Some(target) {
            return Ok(());
        }
        self.cleanup(shared, console);

        let Some(result) = self.call(target, shared, console, |mode, ctx| mode.setup(ctx)) else {
            return Ok(());
        };

        match result {
            Ok(()) => {
                self.active = Some(target);
                info!("Mode {} active", target);
                Ok(())
            }
            Err(err) => {
                error!("Mode {} setup failed: {}", target, err);
                Self::reclaim(target, shared, console);
                Err(err)
            }
        }
    }

    /// Per-tick work for the active mode
    pub fn service(&mut self, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        if let Some(index) = self.active {
            self.call(index, shared, console, |mode, ctx| mode.service(ctx));
        }
    }

    /// Tear down the active mode
    ///
    /// Claims the mode forgot to release are released here.
    pub fn cleanup(&mut self, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        let Some(index) = self.active.take() else {
            return;
        };
        self.call(index, shared, console, |mode, ctx| mode.cleanup(ctx));
        Self::reclaim(index, shared, console);
        info!("Mode {} cleaned up", index);
    }

    /// Forward a frequency change to the active mode
    pub fn configure(
        &mut self,
        shared: &mut SharedResources<'m>,
        console: &mut dyn fmt::Write,
        frequency_hz: u32,
    ) {
        if let Some(index) = self.active {
            self.call(index, shared, console, |mode, ctx| {
                mode.configure(ctx, frequency_hz)
            });
        }
    }

    /// Forward a start request to the active mode
    pub fn start(&mut self, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        if let Some(index) = self.active {
            self.call(index, shared, console, |mode, ctx| mode.start(ctx));
        }
    }

    /// Forward a stop request to the active mode
    pub fn stop(&mut self, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        if let Some(index) = self.active {
            self.call(index, shared, console, |mode, ctx| mode.stop(ctx));
        }
    }

    /// Ask the active mode to print its results
    pub fn report(&mut self, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        if let Some(index) = self.active {
            self.call(index, shared, console, |mode, ctx| mode.report(ctx));
        }
    }

    fn call<R>(
        &mut self,
        index: Owner,
        shared: &mut SharedResources<'m>,
        console: &mut dyn fmt::Write,
        f: impl FnOnce(&mut dyn Mode<'m>, &mut ModeContext<'_, 'm>) -> R,
    ) -> Option<R> {
        let mode = self.modes.get_mut(index)?;
        let mut ctx = shared.context(console, index);
        Some(f(&mut **mode, &mut ctx))
    }

    /// Drop whatever `index` still holds
    ///
    /// Claims are released by owner id. A big-buffer lease cannot be: the
    /// region is a borrowed slice only the mode can hand back, so a leaked
    /// lease is reported and the pool stays unavailable.
    fn reclaim(index: Owner, shared: &mut SharedResources<'m>, console: &mut dyn fmt::Write) {
        let leaked = shared.resources.release_all(index);
        if leaked > 0 {
            warn!("Mode {} left {} claims, released", index, leaked);
        }
        if shared.memory.owner() == Some(index) {
            error!("Mode {} still holds the big buffer", index);
            let _ = write!(
                console,
                "Mode {} did not free the capture buffer, reset to recover\r\n",
                index
            );
        }
    }
}
