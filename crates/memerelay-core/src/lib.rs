#![deny(missing_docs)]
//! MemeRelay core library.
//!
//! Content pipeline shared by every transport: ingestion and filtering,
//! the work queue, batch dispatch with pacing, the delivery history and
//! the resend resolver.

/// Apify scraper client.
pub mod apify;
/// Collaborator interfaces consumed by the pipeline.
pub mod collab;
/// Inbound command parsing and handlers.
pub mod commands;
/// Configuration management.
pub mod config;
/// `.env` backed persistence of the target destination.
pub mod destination;
/// Batch and single-item dispatch.
pub mod dispatcher;
/// Error types.
pub mod error;
/// Admission filter for scraped posts.
pub mod filter;
/// Delivery history ledger.
pub mod history;
/// Queue items and raw scraper records.
pub mod item;
/// HTTP media fetcher.
pub mod media;
/// Randomized pacing and source selection.
pub mod pacing;
/// FIFO work queue.
pub mod queue;
/// Assembly of the pipeline components.
pub mod relay;
/// Resend resolver.
pub mod resolver;
/// Shared mutable pipeline state.
pub mod store;
/// Ingestion cycle.
pub mod supplier;

#[cfg(test)]
pub mod testing;

pub use relay::Relay;
