//! Shared pipeline state behind a single lock.
//!
//! Scheduled jobs and inbound handlers all go through [`RelayStore`]; the
//! guard is never held across network I/O or pacing sleeps.

use crate::history::{HistoryCache, HistoryRecord};
use crate::item::Item;
use crate::queue::WorkQueue;
use tokio::sync::{Mutex, MutexGuard};

/// Mutable state shared by the pipeline components.
#[derive(Debug, Default)]
pub struct RelayState {
    /// Items awaiting dispatch
    pub queue: WorkQueue,
    /// Recent deliveries
    pub history: HistoryCache,
    /// Where scheduled batches are delivered
    pub destination: Option<String>,
}

/// Owner of [`RelayState`], passed by `Arc` to every component.
#[derive(Debug, Default)]
pub struct RelayStore {
    state: Mutex<RelayState>,
}

impl RelayStore {
    /// Creates a store with an empty queue and history.
    #[must_use]
    pub fn new(history_capacity: usize, destination: Option<String>) -> Self {
        Self {
            state: Mutex::new(RelayState {
                queue: WorkQueue::new(),
                history: HistoryCache::new(history_capacity),
                destination,
            }),
        }
    }

    /// Locks the whole state for a compound mutation.
    pub async fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().await
    }

    /// Removes the head of the queue.
    pub async fn take_next(&self) -> Option<Item> {
        self.state.lock().await.queue.dequeue()
    }

    /// Current queue length.
    pub async fn queue_len(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// Appends a delivery to the history.
    pub async fn record_delivery(&self, record: HistoryRecord) {
        self.state.lock().await.history.record(record);
    }

    /// Looks up a delivery by chat and message identifier.
    pub async fn find_delivery(&self, chat: &str, delivery_id: &str) -> Option<HistoryRecord> {
        self.state.lock().await.history.find(chat, delivery_id).cloned()
    }

    /// Current target destination.
    pub async fn destination(&self) -> Option<String> {
        self.state.lock().await.destination.clone()
    }

    /// Replaces the target destination.
    pub async fn set_destination(&self, destination: String) {
        self.state.lock().await.destination = Some(destination);
    }
}
