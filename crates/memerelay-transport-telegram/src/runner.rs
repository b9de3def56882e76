use crate::bot::inbound;
use crate::bot::TelegramMessenger;
use crate::config::BotSettings;
use memerelay_core::apify::ApifyScraper;
use memerelay_core::collab::DestinationStore;
use memerelay_core::commands;
use memerelay_core::destination::EnvFileDestinationStore;
use memerelay_core::media::HttpMediaFetcher;
use memerelay_core::pacing::{Pacer, TokioSleeper};
use memerelay_core::relay::Collaborators;
use memerelay_core::Relay;
use memerelay_runtime::{build_schedule, spawn_scheduler, RelayJobs, SystemClock};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let relay = init_relay(&settings, bot.clone()).await;

    let shutdown = CancellationToken::new();
    let schedule = match build_schedule(&settings.relay) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to build schedule: {}", e);
            std::process::exit(1);
        }
    };
    let scheduler = spawn_scheduler(
        schedule,
        Arc::new(SystemClock),
        Arc::new(TokioSleeper),
        Arc::new(RelayJobs::new(relay.clone())),
        shutdown.clone(),
    );

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![relay, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    shutdown.cancel();
    if let Err(e) = scheduler.await {
        warn!("Scheduler task ended abnormally: {}", e);
    }
}

async fn init_relay(settings: &BotSettings, bot: Bot) -> Arc<Relay> {
    let relay_settings = settings.relay.as_ref();
    let messenger = Arc::new(TelegramMessenger::new(
        bot,
        settings.telegram.protect_content,
    ));
    let destinations = Arc::new(EnvFileDestinationStore::new(&relay_settings.env_file));
    let destination = init_destination(settings, destinations.as_ref()).await;

    let collaborators = Collaborators {
        scraper: Arc::new(ApifyScraper::new(
            relay_settings.apify_token.clone(),
            relay_settings.apify_actor_id.clone(),
        )),
        media: Arc::new(HttpMediaFetcher::new(relay_settings.media_timeout())),
        messenger: messenger.clone(),
        quoted_media: messenger,
        destinations,
    };

    let (min, max) = relay_settings.pacing_bounds();
    let relay = Relay::new(
        relay_settings,
        collaborators,
        Arc::new(Pacer::new(min, max)),
        destination,
    );
    info!(
        "Relay initialized ({} handles, batch {}, low-water mark {}).",
        relay_settings.aggregator_handles().len(),
        relay_settings.batch_size,
        relay_settings.low_water_mark
    );
    Arc::new(relay)
}

async fn init_destination(
    settings: &BotSettings,
    destinations: &dyn DestinationStore,
) -> Option<String> {
    if let Some(id) = settings.relay.target_chat_id.clone() {
        info!("Target chat: {}", id);
        return Some(id);
    }
    match destinations.load().await {
        Ok(Some(id)) => {
            info!("Target chat restored from {}: {}", settings.relay.env_file, id);
            Some(id)
        }
        Ok(None) => {
            warn!("No target chat set. Use !setgroup in the destination chat.");
            None
        }
        Err(e) => {
            error!("Failed to read target chat: {}", e);
            None
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry().branch(Update::filter_message().endpoint(handle_message))
}

async fn handle_message(
    msg: Message,
    relay: Arc<Relay>,
    settings: Arc<BotSettings>,
) -> Result<(), teloxide::RequestError> {
    let Some(event) = inbound::to_event(&msg, &settings.telegram.owner_ids()) else {
        return Ok(());
    };

    if let Err(e) = commands::handle_event(&relay, &event).await {
        error!("Failed to handle message in {}: {}", event.chat, e);
    }
    Ok(())
}
