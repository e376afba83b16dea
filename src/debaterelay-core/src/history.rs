//! Conversation history storage.
//!
//! Turns are kept per conversation identifier for the lifetime of the
//! process. Nothing is evicted; memory grows with every stored turn.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One exchange of user audio and the AI's textual reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The caller's audio clip, base64-encoded exactly as it was received.
    pub user_audio: String,
    pub ai_response: String,
}

impl Turn {
    pub fn new(user_audio: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            user_audio: user_audio.into(),
            ai_response: ai_response.into(),
        }
    }
}

/// Storage for per-conversation turn sequences.
///
/// Implementations must tolerate concurrent calls; appends for different
/// conversations must not interfere with each other.
pub trait HistoryStore: Send + Sync {
    /// Returns the turns stored for `conversation_id`, or an empty vector.
    fn load(&self, conversation_id: &str) -> Vec<Turn>;

    /// Appends a turn, creating the conversation if needed.
    fn save(&self, conversation_id: &str, user_audio: String, ai_response: String);
}

/// Process-lifetime history backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    conversations: DashMap<String, Vec<Turn>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn load(&self, conversation_id: &str) -> Vec<Turn> {
        self.conversations
            .get(conversation_id)
            .map(|turns| turns.value().clone())
            .unwrap_or_default()
    }

    fn save(&self, conversation_id: &str, user_audio: String, ai_response: String) {
        self.conversations
            .entry(conversation_id.to_string())
            .or_default()
            .push(Turn {
                user_audio,
                ai_response,
            });
    }
}
