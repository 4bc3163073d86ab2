use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lets one run of a command through at a time; everyone else gets turned away
/// instead of waiting in line.
#[derive(Clone, Default)]
pub struct SingleFlight(Arc<Mutex<()>>);

/// Held for the length of a run.
pub type Boarding = OwnedMutexGuard<()>;

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if a run is already in progress.
    pub fn try_begin(&self) -> Option<Boarding> {
        Arc::clone(&self.0).try_lock_owned().ok()
    }
}
