//! Per-card operation locks
//!
//! Serializes lifecycle operations against the same card. Each card gets
//! one async mutex, created on first use; holding it spans a whole
//! read-modify-write sequence, which is what closes the lost-update hazard
//! on `current_limit` between concurrent operations.

use crate::types::CardId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of card id to its operation lock
pub struct CardLockMap {
    locks: DashMap<CardId, Arc<Mutex<()>>>,
}

impl CardLockMap {
    /// Create an empty lock map
    pub fn new() -> Self {
        CardLockMap {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for one card, creating it on first use
    ///
    /// The shard guard is dropped before awaiting so other cards' locks
    /// stay reachable while this one is held.
    pub async fn acquire(&self, card_id: CardId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(card_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

impl Default for CardLockMap {
    fn default() -> Self {
        Self::new()
    }
}
