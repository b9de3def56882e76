//! Batch and single-item dispatch.
//!
//! A dispatch dequeues the head item, fetches its media, sends it and records
//! the delivery. Items that fail are dropped, never re-queued.

use crate::collab::{MediaFetcher, Messenger};
use crate::error::{ConfigurationError, DispatchError};
use crate::history::HistoryRecord;
use crate::item::Item;
use crate::pacing::Pacer;
use crate::store::RelayStore;
use crate::supplier::{RestockReport, Supplier};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default number of items per scheduled batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;
/// Default queue length below which a batch restocks first.
pub const DEFAULT_LOW_WATER_MARK: usize = 5;

/// Result of the emergency restock performed before a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmergencyRestock {
    /// Restock completed
    Completed(RestockReport),
    /// Restock failed; the batch went ahead with what was queued
    Failed(String),
}

/// Summary of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Deliveries in send order
    pub sent: Vec<HistoryRecord>,
    /// Items dropped because their media could not be fetched
    pub fetch_failures: usize,
    /// Items dropped because the platform rejected them
    pub delivery_failures: usize,
    /// Emergency restock, when the queue was below the low-water mark
    pub restock: Option<EmergencyRestock>,
    /// True when the queue ran out before the batch size was reached
    pub drained: bool,
}

/// Sends queued items to their destination.
pub struct Dispatcher {
    store: Arc<RelayStore>,
    supplier: Arc<Supplier>,
    media: Arc<dyn MediaFetcher>,
    messenger: Arc<dyn Messenger>,
    pacer: Arc<Pacer>,
    batch_size: usize,
    low_water_mark: usize,
    gate: Mutex<()>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        store: Arc<RelayStore>,
        supplier: Arc<Supplier>,
        media: Arc<dyn MediaFetcher>,
        messenger: Arc<dyn Messenger>,
        pacer: Arc<Pacer>,
    ) -> Self {
        Self {
            store,
            supplier,
            media,
            messenger,
            pacer,
            batch_size: DEFAULT_BATCH_SIZE,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
            gate: Mutex::new(()),
        }
    }

    /// Overrides batch size and low-water mark.
    #[must_use]
    pub const fn with_limits(mut self, batch_size: usize, low_water_mark: usize) -> Self {
        self.batch_size = batch_size;
        self.low_water_mark = low_water_mark;
        self
    }

    /// Runs one scheduled batch to the stored destination.
    ///
    /// Tops the queue up first when it is below the low-water mark, then
    /// sends up to the batch size, pausing between sends. One failed item
    /// never aborts the rest.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoDestination`] without touching the
    /// queue when no destination is set.
    pub async fn run_batch(&self) -> Result<BatchReport, DispatchError> {
        let _batch = self.gate.lock().await;

        let destination = self
            .store
            .destination()
            .await
            .ok_or(ConfigurationError::NoDestination)?;

        let mut report = BatchReport::default();

        if self.store.queue_len().await < self.low_water_mark {
            info!("[Dispatcher] Queue below {}, restocking first", self.low_water_mark);
            report.restock = Some(match self.supplier.restock().await {
                Ok(restock) => EmergencyRestock::Completed(restock),
                Err(e) => {
                    warn!("[Dispatcher] Emergency restock failed: {e}");
                    EmergencyRestock::Failed(e.to_string())
                }
            });
        }

        for position in 0..self.batch_size {
            // Items stay queued while the pacer waits.
            if position > 0 {
                if self.store.queue_len().await == 0 {
                    report.drained = true;
                    break;
                }
                let delay = self.pacer.pause().await;
                debug!("[Dispatcher] Paced {:.1}s", delay.as_secs_f64());
            }
            let Some(item) = self.store.take_next().await else {
                report.drained = true;
                break;
            };

            match self.deliver(&destination, &item).await {
                Ok(record) => report.sent.push(record),
                Err(DispatchError::MediaFetch(e)) => {
                    warn!("[Dispatcher] Dropping {}: {e}", item.url());
                    report.fetch_failures += 1;
                }
                Err(e) => {
                    warn!("[Dispatcher] Send of {} failed: {e}", item.url());
                    report.delivery_failures += 1;
                }
            }
        }

        info!(
            "[Dispatcher] Batch done: sent {}, dropped {}, failed {}",
            report.sent.len(),
            report.fetch_failures,
            report.delivery_failures
        );
        Ok(report)
    }

    /// Sends the head item to `destination` right away.
    ///
    /// No pacing and no low-water restock. Returns `Ok(None)` when the queue
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MediaFetch`] or [`DispatchError::Delivery`];
    /// the item is dropped in both cases.
    pub async fn dispatch_one(
        &self,
        destination: &str,
    ) -> Result<Option<HistoryRecord>, DispatchError> {
        let Some(item) = self.store.take_next().await else {
            return Ok(None);
        };
        self.deliver(destination, &item).await.map(Some)
    }

    async fn deliver(&self, destination: &str, item: &Item) -> Result<HistoryRecord, DispatchError> {
        let image = self.media.fetch(item.url()).await?;
        let receipt = self
            .messenger
            .send_image(destination, image, item.caption(), None)
            .await?;

        let record = HistoryRecord {
            chat: destination.to_string(),
            delivery_id: receipt.delivery_id,
            url: item.url().to_string(),
        };
        self.store.record_delivery(record.clone()).await;
        Ok(record)
    }
}
