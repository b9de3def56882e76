//! Testing helpers and in-memory fakes.

use crate::collab::{DeliveryReceipt, Messenger};
use crate::error::DeliveryError;
use crate::item::PostRecord;
use crate::pacing::{Pacer, Sleeper};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scraped image post with the given URL and caption.
#[must_use]
pub fn image_post(url: &str, caption: &str) -> PostRecord {
    PostRecord {
        display_url: Some(url.to_string()),
        caption: Some(caption.to_string()),
        kind: Some("Image".to_string()),
        ..PostRecord::default()
    }
}

/// Seeded pacer that never waits.
#[must_use]
pub fn zero_pacer() -> Pacer {
    Pacer::with_parts(
        StdRng::seed_from_u64(42),
        Arc::new(RecordingSleeper::default()),
        Duration::ZERO,
        Duration::ZERO,
    )
}

/// Sleeper that returns immediately and remembers every request.
#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Durations requested so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(duration);
        }
    }
}

/// Something the [`FakeMessenger`] was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// `send_image`
    Image {
        /// Target
        destination: String,
        /// Caption
        caption: String,
        /// Reply target
        reply_to: Option<String>,
    },
    /// `send_text`
    Text {
        /// Target
        destination: String,
        /// Body
        text: String,
    },
    /// `react`
    Reaction {
        /// Reacted message
        message_id: String,
        /// Symbol
        symbol: String,
    },
}

/// Messenger that accepts everything and hands out sequential ids.
#[derive(Default)]
pub struct FakeMessenger {
    next_id: AtomicUsize,
    log: Mutex<Vec<Sent>>,
}

impl FakeMessenger {
    /// Every call in order.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Captions of sent images in order.
    #[must_use]
    pub fn captions(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Image { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    /// Bodies of sent texts in order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, sent: Sent) -> DeliveryReceipt {
        if let Ok(mut log) = self.log.lock() {
            log.push(sent);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        DeliveryReceipt {
            delivery_id: format!("msg-{id}"),
        }
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_image(
        &self,
        destination: &str,
        _image: Vec<u8>,
        caption: &str,
        reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(self.push(Sent::Image {
            destination: destination.to_string(),
            caption: caption.to_string(),
            reply_to,
        }))
    }

    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        _reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(self.push(Sent::Text {
            destination: destination.to_string(),
            text: text.to_string(),
        }))
    }

    async fn react(
        &self,
        _destination: &str,
        message_id: &str,
        symbol: &str,
    ) -> Result<(), DeliveryError> {
        self.push(Sent::Reaction {
            message_id: message_id.to_string(),
            symbol: symbol.to_string(),
        });
        Ok(())
    }
}
