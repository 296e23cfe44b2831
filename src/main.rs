use bg_remover_bot::bot::handlers::{self, Command};
use bg_remover_bot::config::{Settings, PROCESSING_ERROR_MESSAGE};
use bg_remover_bot::removal::RemoveBgClient;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting secrets from log output.
///
/// teloxide embeds the bot token in the request URLs it reports in error
/// messages, and reqwest errors can echo request headers.
struct RedactionPatterns {
    token_url: Regex,
    token_bare: Regex,
    api_key_header: Regex,
    api_key_env: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)")?,
            token_bare: Regex::new(r"[0-9]{8,10}:[A-Za-z0-9_-]{35}")?,
            api_key_header: Regex::new(r"(?i)(x-api-key[:=]\s*)\S+")?,
            api_key_env: Regex::new(r"REMOVE_BG_API_KEY=[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .token_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .token_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .api_key_header
            .replace_all(&output, "$1[MASKED]")
            .to_string();
        output = self
            .api_key_env
            .replace_all(&output, "REMOVE_BG_API_KEY=[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length even if redaction changed it,
        // to satisfy the Write contract.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: self.patterns.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Background Remover Bot...");

    let settings = init_settings();

    let client = Arc::new(RemoveBgClient::new(&settings));
    info!("remove.bg client initialized.");

    let bot = Bot::new(settings.telegram_token.clone());

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![client])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            // Fail closed: a missing token or API key must not start the bot
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message| msg.photo().is_some())
                    .endpoint(handle_photo),
            ),
    )
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Help => handlers::help(bot, msg).await,
    };
    if let Err(e) = res {
        error!("Command error: {:#}", e);
    }
    respond(())
}

async fn handle_photo(
    bot: Bot,
    msg: Message,
    client: Arc<RemoveBgClient>,
) -> Result<(), teloxide::RequestError> {
    let chat_id = msg.chat.id;
    if let Err(e) = handlers::handle_photo(bot.clone(), msg, client).await {
        // Last-resort catch: the handler already resolved the categorized
        // failures, so anything landing here is an unknown error. Full
        // detail goes to the log, the user gets the generic text.
        error!("Photo handler error: {:#}", e);
        if let Err(send_err) = bot.send_message(chat_id, PROCESSING_ERROR_MESSAGE).await {
            error!("Failed to send error message: {}", send_err);
        }
    }
    respond(())
}
