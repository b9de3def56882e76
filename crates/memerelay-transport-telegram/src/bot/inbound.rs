//! Conversion of Telegram messages into [`InboundEvent`]s.

use memerelay_core::collab::MediaHandle;
use memerelay_core::commands::InboundEvent;
use memerelay_core::resolver::QuotedMessage;
use std::collections::HashSet;
use teloxide::types::Message;

/// Returns the sender's user id, or 0 for anonymous senders.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// File id of the largest photo attached to `msg`.
#[must_use]
pub fn largest_photo(msg: &Message) -> Option<MediaHandle> {
    msg.photo()
        .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
        .map(|p| MediaHandle(p.file.id.to_string()))
}

/// Normalizes a message. Messages with neither text nor caption are dropped.
#[must_use]
pub fn to_event(msg: &Message, owners: &HashSet<i64>) -> Option<InboundEvent> {
    let body = msg.text().or_else(|| msg.caption())?;

    let quoted = msg.reply_to_message().map(|quoted| QuotedMessage {
        id: quoted.id.0.to_string(),
        image: largest_photo(quoted),
    });

    Some(InboundEvent {
        sender_is_owner: owners.contains(&get_user_id_safe(msg)),
        chat: msg.chat.id.0.to_string(),
        message_id: msg.id.0.to_string(),
        body: body.to_string(),
        quoted,
    })
}
