use crate::collab::{DestinationStore, MediaFetcher, Messenger, QuotedMedia, Scraper};
use crate::config::RelaySettings;
use crate::dispatcher::Dispatcher;
use crate::pacing::Pacer;
use crate::resolver::Resolver;
use crate::store::RelayStore;
use crate::supplier::Supplier;
use std::sync::Arc;

/// Production or test implementations of every collaborator.
#[derive(Clone)]
pub struct Collaborators {
    /// Source of candidate posts
    pub scraper: Arc<dyn Scraper>,
    /// Image downloader
    pub media: Arc<dyn MediaFetcher>,
    /// Messaging platform
    pub messenger: Arc<dyn Messenger>,
    /// Downloader for media on quoted messages
    pub quoted_media: Arc<dyn QuotedMedia>,
    /// Persistence of the target destination
    pub destinations: Arc<dyn DestinationStore>,
}

/// The assembled pipeline, shared by scheduled jobs and inbound handlers.
pub struct Relay {
    /// Shared queue, history and destination
    pub store: Arc<RelayStore>,
    /// Ingestion
    pub supplier: Arc<Supplier>,
    /// Dispatch
    pub dispatcher: Dispatcher,
    /// Resend requests
    pub resolver: Resolver,
    /// Messaging platform, for command replies
    pub messenger: Arc<dyn Messenger>,
    /// Persistence of the target destination
    pub destinations: Arc<dyn DestinationStore>,
}

impl Relay {
    /// Wires the components around one store.
    #[must_use]
    pub fn new(
        settings: &RelaySettings,
        collaborators: Collaborators,
        pacer: Arc<Pacer>,
        destination: Option<String>,
    ) -> Self {
        let store = Arc::new(RelayStore::new(settings.history_capacity, destination));
        let supplier = Arc::new(Supplier::new(
            collaborators.scraper,
            store.clone(),
            pacer.clone(),
            settings.aggregator_handles(),
            settings.results_limit,
        ));
        let dispatcher = Dispatcher::new(
            store.clone(),
            supplier.clone(),
            collaborators.media.clone(),
            collaborators.messenger.clone(),
            pacer,
        )
        .with_limits(settings.batch_size, settings.low_water_mark);
        let resolver = Resolver::new(
            store.clone(),
            collaborators.media,
            collaborators.quoted_media,
            collaborators.messenger.clone(),
        );

        Self {
            store,
            supplier,
            dispatcher,
            resolver,
            messenger: collaborators.messenger,
            destinations: collaborators.destinations,
        }
    }
}
