//! Error types for the content pipeline.
//!
//! Every error here is recoverable; none of them should take the process down.

use thiserror::Error;

/// Failure of one ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// Scraper service unreachable
    #[error("Network error: {0}")]
    Network(String),
    /// Scraper service answered with an error
    #[error("API error: {0}")]
    Api(String),
    /// Scraper response could not be decoded
    #[error("JSON error: {0}")]
    Json(String),
    /// No aggregation handles are configured
    #[error("No aggregation handles configured")]
    NoSources,
}

/// Failure to download media bytes.
#[derive(Error, Debug)]
pub enum MediaFetchError {
    /// Connection or transfer failure
    #[error("Network error: {0}")]
    Network(String),
    /// Content host answered with a non-success status
    #[error("Server responded with status {0}")]
    Status(u16),
    /// Fetch exceeded its time budget
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

/// Failure reported by the messaging platform.
#[derive(Error, Debug)]
#[error("Delivery error: {0}")]
pub struct DeliveryError(pub String);

/// Missing configuration needed by a dispatch.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No target destination has been set
    #[error("No target destination set")]
    NoDestination,
}

/// Failure to persist or read the target destination.
#[derive(Error, Debug)]
pub enum DestinationStoreError {
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure of a dispatch operation.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// See [`ConfigurationError`]
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// See [`MediaFetchError`]
    #[error(transparent)]
    MediaFetch(#[from] MediaFetchError),
    /// See [`DeliveryError`]
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
