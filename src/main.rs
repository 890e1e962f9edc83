use dotenvy::dotenv;
use gemini_tg::bot::handlers::{self, Command};
use gemini_tg::config::Settings;
use gemini_tg::history::ChatHistory;
use gemini_tg::llm::GeminiClient;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
///
/// The Gemini API key travels in the request URL (`?key=`), so failing
/// URLs must be masked before they reach the log output.
struct RedactionPatterns {
    bot_url: Regex,
    bot_token: Regex,
    api_key_param: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bot_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)")?,
            bot_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            api_key_param: Regex::new(r"([?&]key=)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .bot_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .bot_token
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .api_key_param
            .replace_all(&output, "$1[GEMINI_API]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length to satisfy the contract even when
        // the redacted string length differs.
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

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    // Redaction patterns must exist before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Gemini TG bot...");

    let settings = init_settings();
    if settings.gemini_api.is_none() {
        // Not fatal: the command replies with setup instructions
        warn!("GEMINI_API is not configured; /gemini will ask for it");
    }

    let history = Arc::new(ChatHistory::new());
    let llm = Arc::new(GeminiClient::new(&settings));
    info!("Generation client initialized (model: {}).", settings.model());

    let bot = Bot::new(settings.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![settings, history, llm])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
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
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Safe extraction of the sender id from a message.
/// Returns 0 if the user information is missing.
fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter(|msg: Message, settings: Arc<Settings>| {
                    settings.is_allowed(get_user_id_safe(&msg))
                })
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_fallback))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    settings: Arc<Settings>,
    history: Arc<ChatHistory>,
    llm: Arc<GeminiClient>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Gemini(args) => {
            Box::pin(handlers::gemini(bot, msg, args, settings, history, llm)).await
        }
        Command::Healthcheck => handlers::healthcheck(bot, msg).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

/// Everything that fell through the command branch: plain chatter from
/// authorized users is ignored, unauthorized senders get a denial.
async fn handle_fallback(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);
    if settings.is_allowed(user_id) {
        return respond(());
    }

    info!("Unauthorized access from user {}.", user_id);
    if let Err(e) = bot.send_message(msg.chat.id, "Access denied").await {
        error!("Failed to send access denied message to {}: {}", user_id, e);
    }
    respond(())
}
