//! Configuration and settings management
//!
//! Loads settings from environment variables and defines the constants
//! used by the command flow.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Base URL of the Gemini REST API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used when `GEMINI_MODEL` is not configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Combined prompt + reply length below which the answer is edited into
/// the status message instead of being sent as a file.
pub const INLINE_REPLY_LIMIT: usize = 4096;

/// Prompt preview length shown in the "Generating" status message.
pub const STATUS_PREVIEW_CHARS: usize = 128;

/// Prompt preview length used in the caption of a file reply.
pub const CAPTION_PREVIEW_CHARS: usize = 200;

/// Filename for long answers shipped as a document.
pub const REPLY_FILE_NAME: &str = "gemini.txt";

/// Prompt substituted when a text attachment arrives without a query.
pub const DEFAULT_FILE_PROMPT: &str = "Can you help me with this?";

/// Argument that clears the chat history instead of generating.
pub const CLEAR_SENTINEL: &str = "-c";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Comma-separated list of allowed user IDs; empty allows everyone
    #[serde(rename = "allowed_users")]
    pub allowed_users_str: Option<String>,

    /// Gemini API key
    pub gemini_api: Option<String>,
    /// Gemini model override
    pub gemini_model: Option<String>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case;
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Fallback: check the environment directly if config didn't pick
        // the key up (automatic mapping behavior differs between sources)
        if settings.gemini_api.is_none() {
            if let Ok(val) = std::env::var("GEMINI_API") {
                if !val.is_empty() {
                    settings.gemini_api = Some(val);
                }
            }
        }

        Ok(settings)
    }

    /// Returns the set of Telegram IDs that are allowed to use the bot
    #[must_use]
    pub fn allowed_users(&self) -> HashSet<i64> {
        self.allowed_users_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the given user may talk to the bot.
    ///
    /// An empty or missing `ALLOWED_USERS` list answers everyone.
    #[must_use]
    pub fn is_allowed(&self, user_id: i64) -> bool {
        let allowed = self.allowed_users();
        allowed.is_empty() || allowed.contains(&user_id)
    }

    /// The model id to generate with.
    #[must_use]
    pub fn model(&self) -> &str {
        self.gemini_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_GEMINI_MODEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            allowed_users_str: None,
            gemini_api: None,
            gemini_model: None,
        }
    }

    #[test]
    fn test_list_parsing() {
        let mut settings = bare_settings();

        // Comma separated
        settings.allowed_users_str = Some("123,456".to_string());
        let allowed = settings.allowed_users();
        assert!(allowed.contains(&123));
        assert!(allowed.contains(&456));
        assert_eq!(allowed.len(), 2);

        // Semicolon and mixed separators
        settings.allowed_users_str = Some("333; 444, 555".to_string());
        let allowed = settings.allowed_users();
        assert_eq!(allowed.len(), 3);

        // Bad tokens are skipped
        settings.allowed_users_str = Some("abc, 777".to_string());
        let allowed = settings.allowed_users();
        assert!(allowed.contains(&777));
        assert_eq!(allowed.len(), 1);
    }

    #[test]
    fn test_empty_list_allows_everyone() {
        let mut settings = bare_settings();
        assert!(settings.is_allowed(42));

        settings.allowed_users_str = Some(String::new());
        assert!(settings.is_allowed(42));

        settings.allowed_users_str = Some("1".to_string());
        assert!(settings.is_allowed(1));
        assert!(!settings.is_allowed(42));
    }

    #[test]
    fn test_model_default() {
        let mut settings = bare_settings();
        assert_eq!(settings.model(), DEFAULT_GEMINI_MODEL);

        settings.gemini_model = Some(String::new());
        assert_eq!(settings.model(), DEFAULT_GEMINI_MODEL);

        settings.gemini_model = Some("gemini-1.5-pro".to_string());
        assert_eq!(settings.model(), "gemini-1.5-pro");
    }
}
