//! Ingestion cycle: scrape one random source, filter, deduplicate, enqueue.

use crate::collab::{ScrapeRequest, Scraper};
use crate::error::IngestionError;
use crate::filter;
use crate::item::Item;
use crate::pacing::Pacer;
use crate::queue;
use crate::store::RelayStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Outcome of a successful restock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockReport {
    /// Items appended during this cycle
    pub added: usize,
    /// Queue length after the cycle
    pub queue_size: usize,
}

/// Pulls new candidate items into the work queue.
pub struct Supplier {
    scraper: Arc<dyn Scraper>,
    store: Arc<RelayStore>,
    pacer: Arc<Pacer>,
    handles: Vec<String>,
    results_limit: u32,
    // Serializes cycles so a manual restock never overlaps a scheduled one.
    gate: Mutex<()>,
}

impl Supplier {
    /// Creates a supplier drawing from `handles`.
    #[must_use]
    pub fn new(
        scraper: Arc<dyn Scraper>,
        store: Arc<RelayStore>,
        pacer: Arc<Pacer>,
        handles: Vec<String>,
        results_limit: u32,
    ) -> Self {
        Self {
            scraper,
            store,
            pacer,
            handles,
            results_limit,
            gate: Mutex::new(()),
        }
    }

    /// Runs one ingestion cycle.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestionError`] when no handle is configured or the
    /// scraper fails. Items appended before the failure stay queued.
    pub async fn restock(&self) -> Result<RestockReport, IngestionError> {
        let _cycle = self.gate.lock().await;

        let handle = self.pacer.pick(&self.handles).ok_or(IngestionError::NoSources)?;
        info!("[Supplier] Looting @{handle}...");

        let request = ScrapeRequest::for_handle(handle, self.results_limit);
        let posts = self.scraper.fetch_posts(&request).await.map_err(|e| {
            error!("[Supplier] Scrape of @{handle} failed: {e}");
            e
        })?;

        let mut state = self.store.lock().await;
        let mut added = 0;
        for post in posts.iter().filter(|p| filter::admit(p)) {
            let Some(url) = post.image_url() else {
                continue;
            };
            if queue::is_new(&state.queue, url)
                && state.queue.enqueue(Item::new(url, post.caption_text()))
            {
                added += 1;
            }
        }

        let report = RestockReport {
            added,
            queue_size: state.queue.len(),
        };
        info!(
            "[Supplier] Success! Added {}. Queue: {}",
            report.added, report.queue_size
        );
        Ok(report)
    }
}
