//! Inbound command parsing and handling.
//!
//! Transports normalize platform messages into [`InboundEvent`]s; everything
//! after that is platform independent.

use crate::error::DispatchError;
use crate::relay::Relay;
use crate::resolver::{QuotedMessage, ResendRequest, ResolveOutcome};
use tracing::{debug, error, info, warn};

/// Platform-neutral view of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Whether the sender may run privileged commands
    pub sender_is_owner: bool,
    /// Chat the message arrived in
    pub chat: String,
    /// Identifier of the message itself
    pub message_id: String,
    /// Text or caption
    pub body: String,
    /// Message this one replies to
    pub quoted: Option<QuotedMessage>,
}

/// Recognized commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the head of the queue to the current chat now
    ForceSend,
    /// Report the queue length
    ShowQueue,
    /// Run an ingestion cycle now (owner only)
    Restock,
    /// Make the current chat the batch destination (owner only)
    SetDestination,
    /// Resend the quoted image
    ResendRequest(QuotedMessage),
    /// Anything else
    Unrecognized,
}

impl Command {
    /// Maps an inbound event to a command.
    ///
    /// Privileged commands from non-owners are [`Command::Unrecognized`].
    #[must_use]
    pub fn parse(event: &InboundEvent) -> Self {
        let text = event.body.trim().to_lowercase();
        match text.as_str() {
            "!banger" => return Self::ForceSend,
            "!queue" => return Self::ShowQueue,
            "!testapify" | "!restock" if event.sender_is_owner => return Self::Restock,
            "!setgroup" if event.sender_is_owner => return Self::SetDestination,
            _ => {}
        }

        let wants_resend = text.contains("pls send") || text == "save" || text == "steal";
        match &event.quoted {
            Some(quoted) if wants_resend => Self::ResendRequest(quoted.clone()),
            _ => Self::Unrecognized,
        }
    }
}

/// Handles one inbound event end to end.
///
/// # Errors
///
/// Returns an error only when a reply to the requester could not be sent.
pub async fn handle_event(relay: &Relay, event: &InboundEvent) -> Result<(), DispatchError> {
    match Command::parse(event) {
        Command::ForceSend => force_send(relay, event).await,
        Command::ShowQueue => show_queue(relay, event).await,
        Command::Restock => restock(relay, event).await,
        Command::SetDestination => set_destination(relay, event).await,
        Command::ResendRequest(quoted) => {
            let request = ResendRequest {
                chat: event.chat.clone(),
                request_id: event.message_id.clone(),
                quoted,
            };
            let outcome = relay.resolver.resolve(&request).await;
            if outcome == ResolveOutcome::Unrecoverable {
                info!("[Commands] Resend in {} not recoverable", event.chat);
            }
            Ok(())
        }
        Command::Unrecognized => Ok(()),
    }
}

async fn reply(relay: &Relay, event: &InboundEvent, text: &str) -> Result<(), DispatchError> {
    relay.messenger.send_text(&event.chat, text, None).await?;
    Ok(())
}

async fn force_send(relay: &Relay, event: &InboundEvent) -> Result<(), DispatchError> {
    match relay.dispatcher.dispatch_one(&event.chat).await {
        Ok(Some(record)) => {
            info!("[Commands] Manual send {} -> {}", record.url, record.delivery_id);
            Ok(())
        }
        Ok(None) => reply(relay, event, "Queue is empty.").await,
        Err(e) => {
            warn!("[Commands] Manual send failed: {e}");
            reply(relay, event, &format!("❌ Error: {e}")).await
        }
    }
}

async fn show_queue(relay: &Relay, event: &InboundEvent) -> Result<(), DispatchError> {
    let count = {
        let state = relay.store.lock().await;
        let items: Vec<_> = state.queue.iter().collect();
        match serde_json::to_string_pretty(&items) {
            Ok(dump) => debug!("[Commands] Queue contents:\n{dump}"),
            Err(e) => debug!("[Commands] Queue dump failed: {e}"),
        }
        state.queue.len()
    };
    reply(relay, event, &format!("📦 Stock: {count} memes.")).await
}

async fn restock(relay: &Relay, event: &InboundEvent) -> Result<(), DispatchError> {
    reply(relay, event, "🔄 Testing Apify...").await?;
    let text = match relay.supplier.restock().await {
        Ok(report) => format!(
            "✅ Added {} memes. Queue: {}",
            report.added, report.queue_size
        ),
        Err(e) => format!("❌ Error: {e}"),
    };
    reply(relay, event, &text).await
}

async fn set_destination(relay: &Relay, event: &InboundEvent) -> Result<(), DispatchError> {
    relay.store.set_destination(event.chat.clone()).await;
    if let Err(e) = relay.destinations.save(&event.chat).await {
        error!("[Commands] Failed to persist destination {}: {e}", event.chat);
    }
    info!("[Commands] Target destination set to {}", event.chat);
    reply(relay, event, &format!("✅ Target Group Set: {}", event.chat)).await
}
