use dotenvy::dotenv;
use memerelay_core::config::RelaySettings;
use memerelay_transport_telegram::config::{BotSettings, TelegramSettings};
use memerelay_transport_telegram::runner::run_bot;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Secret-masking rules applied to every log line.
struct RedactionPatterns {
    rules: Vec<(Regex, &'static str)>,
}

impl RedactionPatterns {
    /// Compiles the Telegram bot token and Apify token rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        let table = [
            // Bot API URLs and bare `<id>:<secret>` tokens
            (r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+", "${1}[TELEGRAM_TOKEN]"),
            (r"[0-9]{8,10}:[A-Za-z0-9_-]{35}", "[TELEGRAM_TOKEN]"),
            // Apify run URLs, env dumps and raw keys
            (r"([?&]token=)[^\s&]+", "${1}[MASKED]"),
            (r"APIFY_TOKEN=[^\s&]+", "APIFY_TOKEN=[MASKED]"),
            (r"apify_api_[A-Za-z0-9]+", "[APIFY_TOKEN]"),
        ];
        let rules = table
            .into_iter()
            .map(|(pattern, mask)| Regex::new(pattern).map(|re| (re, mask)))
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    fn redact(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |line, (re, mask)| {
                re.replace_all(&line, *mask).into_owned()
            })
    }
}

/// `MakeWriter` handing out stderr writers that mask secrets.
#[derive(Clone)]
struct RedactedStderr(Arc<RedactionPatterns>);

impl Write for RedactedStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = self.0.redact(&String::from_utf8_lossy(buf));
        io::stderr().write_all(line.as_bytes())?;
        // Report the consumed length, not the masked one.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RedactedStderr {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Compiled before logging so nothing is ever written unredacted
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting MemeRelay TG Bot...");

    let settings = init_settings();

    run_bot(settings).await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactedStderr(patterns);

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "memerelay_core=info,memerelay_runtime=info,memerelay_transport_telegram=info,memerelay_telegram_bot=info,hyper=warn,h2=error,reqwest=warn,tokio=warn,teloxide=warn",
            )
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<BotSettings> {
    let relay_settings = match RelaySettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load relay configuration: {}", e);
            std::process::exit(1);
        }
    };
    let telegram_settings = match TelegramSettings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load telegram configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully.");
    Arc::new(BotSettings::new(relay_settings, telegram_settings))
}
