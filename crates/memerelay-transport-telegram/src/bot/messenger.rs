//! Bot API implementations of the pipeline's messaging collaborators.

use super::resilient::{retry_telegram_operation, send_message_resilient};
use async_trait::async_trait;
use memerelay_core::collab::{DeliveryReceipt, MediaHandle, Messenger, QuotedMedia};
use memerelay_core::error::{DeliveryError, MediaFetchError};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, MessageId, ReactionType, ReplyParameters};
use tracing::debug;

/// Parses a destination string back into a Telegram chat id.
///
/// # Errors
///
/// Returns a `DeliveryError` when the string is not a numeric chat id.
pub fn parse_chat_id(destination: &str) -> Result<ChatId, DeliveryError> {
    destination
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| DeliveryError(format!("invalid chat id: {destination}")))
}

/// Parses a delivery id back into a Telegram message id.
///
/// # Errors
///
/// Returns a `DeliveryError` when the string is not a numeric message id.
pub fn parse_message_id(message_id: &str) -> Result<MessageId, DeliveryError> {
    message_id
        .trim()
        .parse::<i32>()
        .map(MessageId)
        .map_err(|_| DeliveryError(format!("invalid message id: {message_id}")))
}

/// Maps a pipeline reaction symbol to one of Telegram's standard reactions.
///
/// Bots may only use the fixed reaction set; ✅ is not part of it.
#[must_use]
pub fn telegram_reaction(symbol: &str) -> &str {
    match symbol {
        "✅" | "✔️" => "👌",
        other => other,
    }
}

fn reply_parameters(reply_to: Option<&str>) -> Result<Option<ReplyParameters>, DeliveryError> {
    reply_to
        .map(|id| parse_message_id(id).map(ReplyParameters::new))
        .transpose()
}

/// Telegram-backed [`Messenger`] and [`QuotedMedia`].
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    protect_content: bool,
}

impl TelegramMessenger {
    /// Wraps a bot handle. `protect_content` marks sent images as not forwardable.
    #[must_use]
    pub const fn new(bot: Bot, protect_content: bool) -> Self {
        Self {
            bot,
            protect_content,
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_image(
        &self,
        destination: &str,
        image: Vec<u8>,
        caption: &str,
        reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let chat_id = parse_chat_id(destination)?;
        let reply = reply_parameters(reply_to.as_deref())?;

        let mut req = self
            .bot
            .send_photo(chat_id, InputFile::memory(image).file_name("meme.jpg"))
            .caption(caption.to_string())
            .protect_content(self.protect_content);
        if let Some(reply) = reply {
            req = req.reply_parameters(reply);
        }

        let sent = req.await.map_err(|e| DeliveryError(e.to_string()))?;
        debug!("Photo {} sent to {}", sent.id.0, destination);
        Ok(DeliveryReceipt {
            delivery_id: sent.id.0.to_string(),
        })
    }

    async fn send_text(
        &self,
        destination: &str,
        text: &str,
        reply_to: Option<String>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let chat_id = parse_chat_id(destination)?;
        let reply = reply_parameters(reply_to.as_deref())?;

        let sent = send_message_resilient(&self.bot, chat_id, text, reply)
            .await
            .map_err(|e| DeliveryError(e.to_string()))?;
        Ok(DeliveryReceipt {
            delivery_id: sent.id.0.to_string(),
        })
    }

    async fn react(
        &self,
        destination: &str,
        message_id: &str,
        symbol: &str,
    ) -> Result<(), DeliveryError> {
        let chat_id = parse_chat_id(destination)?;
        let message_id = parse_message_id(message_id)?;

        retry_telegram_operation(|| async {
            self.bot
                .set_message_reaction(chat_id, message_id)
                .reaction(vec![ReactionType::Emoji {
                    emoji: telegram_reaction(symbol).to_string(),
                }])
                .await?;
            Ok(())
        })
        .await
        .map_err(|e| DeliveryError(e.to_string()))
    }
}

#[async_trait]
impl QuotedMedia for TelegramMessenger {
    async fn download(&self, handle: &MediaHandle) -> Result<Vec<u8>, MediaFetchError> {
        retry_telegram_operation(|| async {
            let file = self.bot.get_file(FileId(handle.0.clone())).await?;
            let mut buf = Vec::new();
            self.bot.download_file(&file.path, &mut buf).await?;
            Ok(buf)
        })
        .await
        .map_err(|e| MediaFetchError::Network(e.to_string()))
    }
}
