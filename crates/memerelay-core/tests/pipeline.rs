use async_trait::async_trait;
use memerelay_core::collab::{
    DeliveryReceipt, DestinationStore, MediaFetcher, MediaHandle, Messenger, QuotedMedia,
    ScrapeRequest, Scraper,
};
use memerelay_core::commands::{handle_event, InboundEvent};
use memerelay_core::config::RelaySettings;
use memerelay_core::error::{
    DeliveryError, DestinationStoreError, DispatchError, IngestionError, MediaFetchError,
};
use memerelay_core::item::PostRecord;
use memerelay_core::pacing::{Pacer, Sleeper};
use memerelay_core::relay::Collaborators;
use memerelay_core::resolver::{QuotedMessage, ResendRequest, ResolveOutcome};
use memerelay_core::Relay;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedScraper {
    posts: Vec<PostRecord>,
    calls: AtomicUsize,
}

#[async_trait]
impl Scraper for ScriptedScraper {
    async fn fetch_posts(&self, _request: &ScrapeRequest) -> Result<Vec<PostRecord>, IngestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.clone())
    }
}

#[derive(Default)]
struct FlakyMedia {
    broken: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaFetcher for FlakyMedia {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaFetchError> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        if self.broken.contains(url) {
            return Err(MediaFetchError::Status(404));
        }
        Ok(url.as_bytes().to_vec())
    }
}

// Numbers messages per chat, like Telegram does.
#[derive(Default)]
struct LogMessenger {
    next: Mutex<HashMap<String, usize>>,
    images: Mutex<Vec<(String, String)>>,
    texts: Mutex<Vec<String>>,
}

#[async_trait]
impl Messenger for LogMessenger {
    async fn send_image(
        &self,
        destination: &str,
        _image: Vec<u8>,
        caption: &str,
        _reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if let Ok(mut images) = self.images.lock() {
            images.push((destination.to_string(), caption.to_string()));
        }
        let id = self.next.lock().map_or(0, |mut next| {
            let counter = next.entry(destination.to_string()).or_insert(0);
            *counter += 1;
            *counter
        });
        Ok(DeliveryReceipt {
            delivery_id: id.to_string(),
        })
    }

    async fn send_text(
        &self,
        _destination: &str,
        text: &str,
        _reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }
        Ok(DeliveryReceipt {
            delivery_id: "text".to_string(),
        })
    }

    async fn react(&self, _: &str, _: &str, _: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

struct NoQuotedMedia;

#[async_trait]
impl QuotedMedia for NoQuotedMedia {
    async fn download(&self, _handle: &MediaHandle) -> Result<Vec<u8>, MediaFetchError> {
        Err(MediaFetchError::Network("expired".to_string()))
    }
}

#[derive(Default)]
struct MemoryDestinations(Mutex<Option<String>>);

#[async_trait]
impl DestinationStore for MemoryDestinations {
    async fn load(&self) -> Result<Option<String>, DestinationStoreError> {
        Ok(self.0.lock().ok().and_then(|d| d.clone()))
    }

    async fn save(&self, destination: &str) -> Result<(), DestinationStoreError> {
        if let Ok(mut d) = self.0.lock() {
            *d = Some(destination.to_string());
        }
        Ok(())
    }
}

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

fn post(url: &str, caption: &str) -> PostRecord {
    PostRecord {
        display_url: Some(url.to_string()),
        caption: Some(caption.to_string()),
        ..PostRecord::default()
    }
}

struct Harness {
    relay: Relay,
    scraper: Arc<ScriptedScraper>,
    media: Arc<FlakyMedia>,
    messenger: Arc<LogMessenger>,
    destinations: Arc<MemoryDestinations>,
}

fn init_tracing() {
    // Visible with `--nocapture`; repeated init from other tests is ignored.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("memerelay_core=debug"))
        .with_test_writer()
        .try_init();
}

fn harness(posts: Vec<PostRecord>, broken: &[&str], destination: Option<&str>) -> Harness {
    init_tracing();
    let scraper = Arc::new(ScriptedScraper {
        posts,
        calls: AtomicUsize::new(0),
    });
    let media = Arc::new(FlakyMedia {
        broken: broken.iter().map(ToString::to_string).collect(),
        ..FlakyMedia::default()
    });
    let messenger = Arc::new(LogMessenger::default());
    let destinations = Arc::new(MemoryDestinations::default());
    let pacer = Arc::new(Pacer::with_parts(
        StdRng::seed_from_u64(5),
        Arc::new(NoSleep),
        Duration::from_secs(10),
        Duration::from_secs(20),
    ));

    let relay = Relay::new(
        &RelaySettings::default(),
        Collaborators {
            scraper: scraper.clone(),
            media: media.clone(),
            messenger: messenger.clone(),
            quoted_media: Arc::new(NoQuotedMedia),
            destinations: destinations.clone(),
        },
        pacer,
        destination.map(ToString::to_string),
    );

    Harness {
        relay,
        scraper,
        media,
        messenger,
        destinations,
    }
}

#[tokio::test]
async fn test_restock_then_batch_then_resend() {
    let long_caption = "ha".repeat(150);
    let h = harness(
        vec![
            post("https://cdn/1.jpg", &long_caption),
            post("https://cdn/2.jpg", "Bet9ja odds"),
            post("https://cdn/3.jpg", "clean"),
        ],
        &[],
        Some("group"),
    );

    let report = h.relay.supplier.restock().await.expect("restock should succeed");
    assert_eq!(report.added, 2);

    let batch = h.relay.dispatcher.run_batch().await.expect("batch should run");
    assert_eq!(batch.sent.len(), 2);
    assert_eq!(h.relay.store.queue_len().await, 0);
    // The emergency restock found only duplicates of what was already queued.
    assert_eq!(h.scraper.calls.load(Ordering::SeqCst), 2);

    let images = h.messenger.images.lock().map(|i| i.clone()).unwrap_or_default();
    assert_eq!(images[0].0, "group");
    assert_eq!(images[0].1.chars().count(), 200);
    assert_eq!(images[1].1, "clean");

    let outcome = h
        .relay
        .resolver
        .resolve(&ResendRequest {
            chat: "group".to_string(),
            request_id: "99".to_string(),
            quoted: QuotedMessage {
                id: batch.sent[1].delivery_id.clone(),
                image: None,
            },
        })
        .await;
    assert_eq!(outcome, ResolveOutcome::FromHistory);
    let fetched = h.media.fetched.lock().map(|f| f.clone()).unwrap_or_default();
    assert_eq!(fetched.last().map(String::as_str), Some("https://cdn/3.jpg"));
}

#[tokio::test]
async fn test_broken_media_is_dropped_not_requeued() {
    let h = harness(
        vec![post("https://cdn/a.jpg", ""), post("https://cdn/b.jpg", "")],
        &["https://cdn/a.jpg"],
        Some("group"),
    );
    h.relay.supplier.restock().await.expect("restock should succeed");

    let batch = h.relay.dispatcher.run_batch().await.expect("batch should run");

    assert_eq!(batch.fetch_failures, 1);
    assert_eq!(batch.sent.len(), 1);
    assert_eq!(batch.sent[0].url, "https://cdn/b.jpg");
    assert!(!h.relay.store.lock().await.queue.contains("https://cdn/a.jpg"));
}

#[tokio::test]
async fn test_batch_skipped_until_destination_set() {
    let h = harness(vec![post("https://cdn/a.jpg", "")], &[], None);

    let result = h.relay.dispatcher.run_batch().await;
    assert!(matches!(result, Err(DispatchError::Configuration(_))));
    assert_eq!(h.scraper.calls.load(Ordering::SeqCst), 0);

    let event = InboundEvent {
        sender_is_owner: true,
        chat: "-100555".to_string(),
        message_id: "1".to_string(),
        body: "!setgroup".to_string(),
        quoted: None,
    };
    handle_event(&h.relay, &event).await.expect("command should succeed");
    assert_eq!(
        h.destinations.load().await.expect("load should work"),
        Some("-100555".to_string())
    );

    let batch = h.relay.dispatcher.run_batch().await.expect("batch should run");
    assert_eq!(batch.sent.len(), 1);
}

#[tokio::test]
async fn test_resend_matches_delivery_in_requesting_chat() {
    let h = harness(
        vec![
            post("https://cdn/dm-meme.jpg", ""),
            post("https://cdn/group-meme.jpg", ""),
        ],
        &[],
        Some("group"),
    );
    h.relay.supplier.restock().await.expect("restock should succeed");

    let manual = InboundEvent {
        sender_is_owner: false,
        chat: "dm".to_string(),
        message_id: "7".to_string(),
        body: "!banger".to_string(),
        quoted: None,
    };
    handle_event(&h.relay, &manual).await.expect("command should succeed");

    let batch = h.relay.dispatcher.run_batch().await.expect("batch should run");
    assert_eq!(batch.sent[0].url, "https://cdn/group-meme.jpg");
    assert_eq!(batch.sent[0].delivery_id, "1");

    let request = InboundEvent {
        sender_is_owner: false,
        chat: "group".to_string(),
        message_id: "42".to_string(),
        body: "pls send".to_string(),
        quoted: Some(QuotedMessage {
            id: "1".to_string(),
            image: None,
        }),
    };
    handle_event(&h.relay, &request).await.expect("command should succeed");

    let fetched = h.media.fetched.lock().map(|f| f.clone()).unwrap_or_default();
    assert_eq!(fetched.last().map(String::as_str), Some("https://cdn/group-meme.jpg"));
}
