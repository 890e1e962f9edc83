//! In-memory chat history, keyed by chat id.
//!
//! The log is diagnostic only: turns are recorded for display and
//! rollback, never fed back into the generation request.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// The human side of the conversation
    User,
    /// The generated side
    Assistant,
}

/// One recorded turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    /// Originator of the turn
    pub role: ChatRole,
    /// Raw text content
    pub content: String,
}

/// Process-wide turn log, injected into handlers as an `Arc`.
///
/// Entries are created lazily on first append and live for the process
/// lifetime; there is no eviction.
#[derive(Debug, Default)]
pub struct ChatHistory {
    turns: Mutex<HashMap<i64, Vec<ChatTurn>>>,
}

impl ChatHistory {
    /// Create an empty history store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the given conversation.
    pub async fn append(&self, chat_id: i64, role: ChatRole, content: impl Into<String>) {
        let mut turns = self.turns.lock().await;
        turns.entry(chat_id).or_default().push(ChatTurn {
            role,
            content: content.into(),
        });
    }

    /// Remove and return the most recent turn of the given conversation.
    ///
    /// Used to roll back the user turn when generation fails.
    pub async fn pop_last(&self, chat_id: i64) -> Option<ChatTurn> {
        let mut turns = self.turns.lock().await;
        turns.get_mut(&chat_id).and_then(Vec::pop)
    }

    /// Wipe the history of EVERY conversation, not just the caller's.
    ///
    /// The `-c` sentinel has always behaved as a global reset; callers
    /// relying on per-chat scoping should not use this store.
    pub async fn clear_all(&self) {
        self.turns.lock().await.clear();
    }

    /// Number of recorded turns for the given conversation.
    pub async fn len(&self, chat_id: i64) -> usize {
        self.turns.lock().await.get(&chat_id).map_or(0, Vec::len)
    }

    /// Whether the given conversation has no recorded turns.
    pub async fn is_empty(&self, chat_id: i64) -> bool {
        self.len(chat_id).await == 0
    }

    /// Copy of the recorded turns for the given conversation.
    pub async fn snapshot(&self, chat_id: i64) -> Vec<ChatTurn> {
        self.turns
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }
}
