use serde::Serialize;
use std::collections::VecDeque;

/// Default number of deliveries remembered.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Chat the item was delivered to
    pub chat: String,
    /// Message identifier assigned by the messaging platform, unique per chat
    pub delivery_id: String,
    /// Source URL of the delivered image
    pub url: String,
}

/// Bounded, insertion-ordered ledger of recent deliveries.
///
/// Eviction is pure FIFO: lookups never refresh an entry's position.
#[derive(Debug)]
pub struct HistoryCache {
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryCache {
    /// Creates an empty cache holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest ones beyond capacity.
    pub fn record(&mut self, record: HistoryRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Finds a record by chat and exact delivery identifier.
    ///
    /// Platforms number messages per chat, so the identifier alone is
    /// ambiguous. The newest match wins.
    #[must_use]
    pub fn find(&self, chat: &str, delivery_id: &str) -> Option<&HistoryRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.chat == chat && r.delivery_id == delivery_id)
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter()
    }
}
