//! Gemini TG - a single-command Telegram bot.
//!
//! Forwards a user prompt (optionally with a replied-to attachment) to
//! the Gemini `generateContent` endpoint and posts the answer back in
//! the chat, either inline or as a text file when the reply is long.

/// Telegram command handlers
pub mod bot;
/// Configuration management
pub mod config;
/// In-memory chat history log
pub mod history;
/// Gemini generation client
pub mod llm;
/// Replied-to attachment extraction
pub mod media;
pub mod utils;
