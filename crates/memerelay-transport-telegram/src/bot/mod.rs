/// Normalization of Telegram messages into pipeline events
pub mod inbound;
/// Messenger and quoted-media implementations over the Bot API
pub mod messenger;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;

pub use messenger::TelegramMessenger;
