//! In-process registry of transfers currently writing to the store.
//!
//! The first caller for a destination becomes the leader and performs the
//! transfer. Later callers for the same destination follow: they wait for
//! the leader's outcome and reuse it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::GpmError;

pub type Outcome = Result<(), Arc<GpmError>>;

type Slot = watch::Receiver<Option<Outcome>>;

#[derive(Clone, Default)]
pub struct InFlight {
    slots: Arc<Mutex<HashMap<PathBuf, Slot>>>,
}

pub enum Claim {
    Leader(LeaderGuard),
    Follower(Follower),
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, destination: &Path) -> Claim {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(destination) {
            return Claim::Follower(Follower { slot: slot.clone() });
        }

        let (tx, rx) = watch::channel(None);
        slots.insert(destination.to_path_buf(), rx);
        Claim::Leader(LeaderGuard {
            registry: self.clone(),
            destination: destination.to_path_buf(),
            tx,
        })
    }
}

/// Held by the caller performing the transfer. Dropping it releases the
/// destination; followers of a guard dropped without [`LeaderGuard::finish`]
/// see the transfer as abandoned.
pub struct LeaderGuard {
    registry: InFlight,
    destination: PathBuf,
    tx: watch::Sender<Option<Outcome>>,
}

impl LeaderGuard {
    pub fn finish(self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        self.registry
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.destination);
    }
}

pub struct Follower {
    slot: Slot,
}

impl Follower {
    /// Wait for the leader's outcome.
    pub async fn wait(mut self) -> Option<Outcome> {
        let outcome = self.slot.wait_for(Option::is_some).await.ok()?;
        outcome.clone()
    }
}
