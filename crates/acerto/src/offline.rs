//! Offline mutation queue.
//!
//! Writes made without a connection are appended to a list in the local
//! store and replayed later as a single batch, in the order they were made.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::{DocumentStore, LocalStore, Write};

/// Local store key holding the queue.
const QUEUE_KEY: &str = "offline_queue";

/// A write waiting for a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    /// The write to replay.
    pub write: Write,
    /// When it was queued.
    pub queued_at: DateTime<Utc>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayReport {
    /// Writes sent and removed from the queue.
    pub replayed: usize,
    /// Writes still queued afterwards (queued while the replay ran).
    pub remaining: usize,
}

/// Persistent queue of pending writes.
#[derive(Debug)]
pub struct OfflineQueue {
    local: LocalStore,
    replaying: AtomicBool,
}

/// Clears the in-flight flag when a replay ends, however it ends.
struct ReplayGuard<'a>(&'a AtomicBool);

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl OfflineQueue {
    /// Use the given local store for the queue.
    #[must_use]
    pub fn open(local: LocalStore) -> Self {
        Self {
            local,
            replaying: AtomicBool::new(false),
        }
    }

    /// The underlying local store.
    #[must_use]
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Append a write.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be written.
    pub fn enqueue(&self, write: Write) -> Result<()> {
        self.enqueue_all(std::iter::once(write))
    }

    /// Append several writes, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be written.
    pub fn enqueue_all(&self, writes: impl IntoIterator<Item = Write>) -> Result<()> {
        let queued_at = Utc::now();
        let len = self
            .local
            .update_json(QUEUE_KEY, |queue: &mut Vec<PendingMutation>| {
                queue.extend(writes.into_iter().map(|write| PendingMutation { write, queued_at }));
                queue.len()
            })?;
        debug!(pending = len, "queued offline write");
        Ok(())
    }

    /// Everything waiting, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read.
    pub fn pending(&self) -> Result<Vec<PendingMutation>> {
        Ok(self.local.get_json(QUEUE_KEY)?.unwrap_or_default())
    }

    /// Number of pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read.
    pub fn len(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }

    /// Whether nothing is waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.pending()?.is_empty())
    }

    /// Drop everything waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be written.
    pub fn clear(&self) -> Result<()> {
        self.local.remove(QUEUE_KEY)?;
        Ok(())
    }

    /// Whether a replay is running.
    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::SeqCst)
    }

    /// Send every pending write to `store` as one batch.
    ///
    /// On success the replayed writes leave the queue; anything queued while
    /// the batch was in flight stays for the next replay. On failure the
    /// queue is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SyncInProgress`] if another replay is running, or the
    /// store's error if the batch fails.
    pub async fn replay(&self, store: &dyn DocumentStore) -> Result<ReplayReport> {
        if self
            .replaying
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::SyncInProgress);
        }
        let _guard = ReplayGuard(&self.replaying);

        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(ReplayReport::default());
        }

        let writes: Vec<Write> = pending.iter().map(|p| p.write.clone()).collect();
        info!(writes = writes.len(), "replaying offline queue");

        if let Err(e) = store.commit_batch(&writes).await {
            warn!("offline replay failed, keeping {} writes: {e}", writes.len());
            return Err(e);
        }

        let replayed = writes.len();
        let remaining = self
            .local
            .update_json(QUEUE_KEY, |queue: &mut Vec<PendingMutation>| {
                let sent = replayed.min(queue.len());
                queue.drain(..sent);
                queue.len()
            })?;
        if remaining == 0 {
            self.clear()?;
        }

        info!(replayed, remaining, "offline queue replayed");
        Ok(ReplayReport { replayed, remaining })
    }
}
