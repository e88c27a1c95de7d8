//! Periodic autosave to the storage channel.
//!
//! The host's event loop calls [`Autosave::tick`] as often as it likes; a
//! snapshot is captured and written only when the interval has elapsed.
//! Only committed registry and graph state is captured; a half-drawn
//! connection gesture is transient and never saved, so an autosave landing
//! mid-gesture is harmless.

use std::time::{Duration, Instant};

use patchbay_core::Workspace;

use crate::error::StateError;
use crate::store::{StateStore, StorageChannel};

/// Default autosave interval.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_millis(250);

/// Interval-gated autosave driver.
#[derive(Debug)]
pub struct Autosave {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new()
    }
}

impl Autosave {
    /// An autosaver with the default interval.
    pub fn new() -> Self {
        Self::with_interval(AUTOSAVE_INTERVAL)
    }

    /// An autosaver with a caller-chosen interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Saves the workspace if the interval has elapsed since the last save.
    /// Returns whether a save happened.
    pub fn tick<S: StateStore>(
        &mut self,
        workspace: &Workspace,
        channel: &mut StorageChannel<S>,
    ) -> Result<bool, StateError> {
        let due = self.last.is_none_or(|last| last.elapsed() >= self.interval);
        if !due {
            return Ok(false);
        }
        channel.save(workspace)?;
        self.last = Some(Instant::now());
        Ok(true)
    }
}
