// file: src/sync/guard.rs
// Per-(user, room) serialization of sync runs. Two concurrent syncs for the
// same pair could each miss the other's freshly inserted mirror records and
// import the same remote event twice; holding the pair's lock for the whole
// run closes that window.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Default)]
pub struct SyncGuard {
    locks: RwLock<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a (user, room) pair, waiting if another sync for
    /// the same pair is in flight. Pairs never contend with each other.
    pub async fn acquire(&self, user_id: &str, room_id: &str) -> OwnedMutexGuard<()> {
        let key = (user_id.to_string(), room_id.to_string());
        let lock = {
            let mut locks = self.locks.write().await;
            locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        lock.lock_owned().await
    }
}
