//! The `/gemini` command flow.
//!
//! Validation → optional history clear → media extraction → generation
//! → response routing (inline edit under the 4096 boundary, file
//! attachment at or above it).

use crate::config::{
    Settings, CAPTION_PREVIEW_CHARS, CLEAR_SENTINEL, DEFAULT_FILE_PROMPT, INLINE_REPLY_LIMIT,
    REPLY_FILE_NAME, STATUS_PREVIEW_CHARS,
};
use crate::history::{ChatHistory, ChatRole};
use crate::llm::{GenError, GenerationBackend, GeminiClient};
use crate::media::{self, MediaPayload};
use crate::utils::{format_text, truncate_str};
use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::error;

/// Commands the bot answers to.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Usage text
    #[command(description = "Show usage.")]
    Start,
    /// The one real command
    #[command(description = "Ask Gemini; reply to a message or file to include it.")]
    Gemini(String),
    /// Liveness probe
    #[command(description = "Check that the bot is alive.")]
    Healthcheck,
}

/// Reply with usage instructions.
///
/// # Errors
///
/// Returns an error if the message fails to send.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let text = format_text(
        "**Get Answers and Generate Content with Gemini**\n\n\
         `/gemini <prompt>` - text response\n\
         `/gemini -c` - clear the chat history\n\n\
         Reply to a message or file with `/gemini` to use it as input.\n\
         Requires the `GEMINI_API` key to be configured.",
    );
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Liveness probe.
///
/// # Errors
///
/// Returns an error if the message fails to send.
pub async fn healthcheck(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, "OK").await?;
    Ok(())
}

/// Handle `/gemini <args>`.
///
/// # Errors
///
/// Returns an error if a Telegram call fails; generation and media
/// failures are reported in-chat, not propagated.
pub async fn gemini(
    bot: Bot,
    msg: Message,
    args: String,
    settings: Arc<Settings>,
    history: Arc<ChatHistory>,
    llm: Arc<GeminiClient>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    if settings.gemini_api.is_none() {
        bot.send_message(
            chat_id,
            "Set the GEMINI_API environment variable to use this command.",
        )
        .await?;
        return Ok(());
    }

    let query = args.trim();
    if query.eq_ignore_ascii_case(CLEAR_SENTINEL) {
        history.clear_all().await;
        bot.send_message(chat_id, format_text("*Gemini chat history cleared.*"))
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    }

    let reply_msg = msg.reply_to_message();
    if query.is_empty() && reply_msg.is_none() {
        bot.send_message(chat_id, "Provide a query or reply to a message.")
            .await?;
        return Ok(());
    }

    let mut prompt = if query.is_empty() {
        reply_msg
            .and_then(|r| r.text().or_else(|| r.caption()))
            .unwrap_or("")
            .to_string()
    } else {
        query.to_string()
    };

    // Extract once; the outcome serves both the input gate and the call
    let outcome = media::extract_reply_media(&bot, &msg).await;
    if prompt.is_empty() && !outcome.has_payload() {
        bot.send_message(chat_id, "Please provide a prompt or a file.")
            .await?;
        return Ok(());
    }
    let payload = outcome.into_payload();

    let status = bot
        .send_message(
            chat_id,
            format_text(&format!(
                "Generating: `{}...`",
                truncate_str(&prompt, STATUS_PREVIEW_CHARS)
            )),
        )
        .parse_mode(ParseMode::Html)
        .await?;

    // A text attachment without an explicit query still needs a prompt
    if prompt.is_empty() {
        if let Some(p) = &payload {
            if p.is_plain_text() {
                prompt = DEFAULT_FILE_PROMPT.to_string();
            }
        }
    }

    match run_generation(&history, chat_id.0, llm.as_ref(), &prompt, payload.as_ref()).await {
        Ok(reply) => respond(&bot, &msg, &status, &prompt, &reply).await?,
        Err(e) => {
            error!("Gemini generation failed: {e}");
            bot.edit_message_text(chat_id, status.id, format!("Error: {e}"))
                .await?;
        }
    }

    Ok(())
}

/// Record the user turn, generate, record the assistant turn.
///
/// On failure the user turn is popped again: a failed invocation leaves
/// the history length unchanged.
///
/// # Errors
///
/// Propagates the backend's `GenError`.
pub async fn run_generation(
    history: &ChatHistory,
    chat_id: i64,
    backend: &dyn GenerationBackend,
    prompt: &str,
    media: Option<&MediaPayload>,
) -> Result<String, GenError> {
    history.append(chat_id, ChatRole::User, prompt).await;
    match backend.generate(prompt, media).await {
        Ok(reply) => {
            history
                .append(chat_id, ChatRole::Assistant, reply.clone())
                .await;
            Ok(reply)
        }
        Err(e) => {
            history.pop_last(chat_id).await;
            Err(e)
        }
    }
}

/// How an answer reaches the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseRoute {
    /// Edit the status message in place
    Inline,
    /// Ship the answer as a text file and drop the status message
    Document,
}

/// Pick the response route from the raw (pre-rendering) lengths.
#[must_use]
pub fn response_route(prompt: &str, reply: &str) -> ResponseRoute {
    if prompt.len() + reply.len() < INLINE_REPLY_LIMIT {
        ResponseRoute::Inline
    } else {
        ResponseRoute::Document
    }
}

async fn respond(
    bot: &Bot,
    msg: &Message,
    status: &Message,
    prompt: &str,
    reply: &str,
) -> Result<()> {
    match response_route(prompt, reply) {
        ResponseRoute::Inline => {
            let text = format_text(&format!("**Query:**\n`{prompt}`\n\n**Gemini:**\n{reply}"));
            bot.edit_message_text(msg.chat.id, status.id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        ResponseRoute::Document => {
            let caption = format_text(&format!(
                "**Query:**\n`{}...`",
                truncate_str(prompt, CAPTION_PREVIEW_CHARS)
            ));
            let document = InputFile::memory(reply.as_bytes().to_vec()).file_name(REPLY_FILE_NAME);
            bot.send_document(msg.chat.id, document)
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            bot.delete_message(msg.chat.id, status.id).await?;
        }
    }
    Ok(())
}
