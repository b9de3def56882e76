//! "Send that again" requests.
//!
//! Tier 1 re-fetches the URL recorded in the delivery history. Tier 2 pulls
//! the image straight out of the quoted message. Running out of tiers is an
//! expected outcome, reported to the requester.

use crate::collab::{MediaFetcher, MediaHandle, Messenger, QuotedMedia};
use crate::error::DispatchError;
use crate::store::RelayStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Reaction acknowledging a history hit.
pub const CACHE_HIT_SYMBOL: &str = "⚡";
/// Reaction acknowledging a quoted image was found.
pub const QUOTE_SEEN_SYMBOL: &str = "👀";
/// Reaction after a quoted image was re-sent.
pub const DONE_SYMBOL: &str = "✅";

const HISTORY_CAPTION: &str = "Here you go 📦";
const QUOTE_CAPTION: &str = "Stolen! 📦";
const NO_MEDIA_TEXT: &str = "I can't see any image there.";
const UNRECOVERABLE_TEXT: &str =
    "Could not download. It might be expired or I don't have the history.";

/// The message a resend request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedMessage {
    /// Platform identifier of the quoted message
    pub id: String,
    /// Image attached to the quoted message, if the platform exposes one
    pub image: Option<MediaHandle>,
}

/// A request to resend a previously seen image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendRequest {
    /// Chat the request came from and the answer goes to
    pub chat: String,
    /// Identifier of the request message itself
    pub request_id: String,
    /// The referenced message
    pub quoted: QuotedMessage,
}

/// How a resend request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Re-fetched from the history URL
    FromHistory,
    /// Downloaded from the quoted message
    FromQuote,
    /// Nothing in history and no image on the quote
    NoMedia,
    /// Every tier failed
    Unrecoverable,
}

/// Answers resend requests.
pub struct Resolver {
    store: Arc<RelayStore>,
    media: Arc<dyn MediaFetcher>,
    quoted_media: Arc<dyn QuotedMedia>,
    messenger: Arc<dyn Messenger>,
}

impl Resolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(
        store: Arc<RelayStore>,
        media: Arc<dyn MediaFetcher>,
        quoted_media: Arc<dyn QuotedMedia>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store,
            media,
            quoted_media,
            messenger,
        }
    }

    /// Resolves `request`, replying in the request's chat.
    pub async fn resolve(&self, request: &ResendRequest) -> ResolveOutcome {
        // Replies always quote a message from the same chat.
        let hit = self.store.find_delivery(&request.chat, &request.quoted.id).await;
        if let Some(record) = hit {
            info!("[Resolver] Cache hit for {}", record.delivery_id);
            self.react(request, CACHE_HIT_SYMBOL).await;

            match self.resend_from_history(request, &record.url).await {
                Ok(()) => return ResolveOutcome::FromHistory,
                Err(e) => warn!("[Resolver] History re-fetch failed, trying quote: {e}"),
            }
        }

        self.resend_from_quote(request).await
    }

    async fn resend_from_history(&self, request: &ResendRequest, url: &str) -> Result<(), DispatchError> {
        let image = self.media.fetch(url).await?;
        self.messenger
            .send_image(
                &request.chat,
                image,
                HISTORY_CAPTION,
                Some(request.request_id.clone()),
            )
            .await?;
        Ok(())
    }

    async fn resend_from_quote(&self, request: &ResendRequest) -> ResolveOutcome {
        let Some(handle) = &request.quoted.image else {
            self.reply(request, NO_MEDIA_TEXT).await;
            return ResolveOutcome::NoMedia;
        };

        self.react(request, QUOTE_SEEN_SYMBOL).await;
        match self.download_and_send(request, handle).await {
            Ok(()) => {
                self.react(request, DONE_SYMBOL).await;
                ResolveOutcome::FromQuote
            }
            Err(e) => {
                warn!("[Resolver] Quote download failed: {e}");
                self.reply(request, UNRECOVERABLE_TEXT).await;
                ResolveOutcome::Unrecoverable
            }
        }
    }

    async fn download_and_send(&self, request: &ResendRequest, handle: &MediaHandle) -> Result<(), DispatchError> {
        let image = self.quoted_media.download(handle).await?;
        self.messenger
            .send_image(&request.chat, image, QUOTE_CAPTION, Some(request.request_id.clone()))
            .await?;
        Ok(())
    }

    async fn react(&self, request: &ResendRequest, symbol: &str) {
        if let Err(e) = self
            .messenger
            .react(&request.chat, &request.request_id, symbol)
            .await
        {
            warn!("[Resolver] Reaction {symbol} failed: {e}");
        }
    }

    async fn reply(&self, request: &ResendRequest, text: &str) {
        if let Err(e) = self.messenger.send_text(&request.chat, text, None).await {
            warn!("[Resolver] Reply failed: {e}");
        }
    }
}
