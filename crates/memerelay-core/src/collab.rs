//! Interfaces of the external collaborators the pipeline drives.
//!
//! Production implementations live in [`crate::apify`], [`crate::media`],
//! [`crate::destination`] and the transport crates.

use crate::error::{DeliveryError, DestinationStoreError, IngestionError, MediaFetchError};
use crate::item::PostRecord;
use async_trait::async_trait;
use serde::Serialize;

/// Input of one scraper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    /// Profile URLs to scrape
    pub direct_urls: Vec<String>,
    /// Kind of results requested
    pub results_type: String,
    /// Maximum number of posts returned
    pub results_limit: u32,
    /// How `direct_urls` are interpreted
    pub search_type: String,
    /// Whether to enrich results with profile data
    pub add_parent_data: bool,
}

impl ScrapeRequest {
    /// Request for the latest posts of one profile handle.
    #[must_use]
    pub fn for_handle(handle: &str, results_limit: u32) -> Self {
        Self {
            direct_urls: vec![format!("https://www.instagram.com/{handle}/")],
            results_type: "posts".to_string(),
            results_limit,
            search_type: "user".to_string(),
            add_parent_data: false,
        }
    }
}

/// Receipt of a successful platform delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Platform message identifier of the sent message
    pub delivery_id: String,
}

/// Opaque platform handle of media attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(pub String);

/// Source of candidate posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Runs one scrape and returns the posts found.
    async fn fetch_posts(&self, request: &ScrapeRequest) -> Result<Vec<PostRecord>, IngestionError>;
}

/// Downloads image bytes from a content host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetches the bytes at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaFetchError>;
}

/// Outbound side of the messaging platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends an image with a caption, optionally as a reply.
    async fn send_image(
        &self,
        destination: &str,
        image: Vec<u8>,
        caption: &str,
        reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Sends a plain text message, optionally as a reply.
    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Attaches a reaction symbol to a message.
    async fn react(
        &self,
        destination: &str,
        message_id: &str,
        symbol: &str,
    ) -> Result<(), DeliveryError>;
}

/// Downloads media attached to a quoted message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotedMedia: Send + Sync {
    /// Fetches the bytes behind `handle`.
    async fn download(&self, handle: &MediaHandle) -> Result<Vec<u8>, MediaFetchError>;
}

/// Durable storage of the target destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Reads the persisted destination, if any.
    async fn load(&self) -> Result<Option<String>, DestinationStoreError>;
    /// Persists a new destination.
    async fn save(&self, destination: &str) -> Result<(), DestinationStoreError>;
}
