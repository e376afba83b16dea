//! Turn orchestration logic.
//!
//! Sequences history lookup, rebuttal generation, and speech synthesis for a
//! single debate turn, and records the turn once everything succeeded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ApiKeys, Config};
use crate::error::DebateError;
use crate::generator::{GeminiModel, ResponseGenerator};
use crate::history::{HistoryStore, InMemoryHistoryStore, Turn};
use crate::synthesizer::{DeepgramSpeech, SpeechSynthesizer};

/// The outcome of one completed debate turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    pub ai_response_text: String,
    pub ai_response_audio_base64: String,
    pub conversation_id: String,
}

/// Runs debate turns against the shared conversation history.
pub struct TurnOrchestrator {
    history: Arc<dyn HistoryStore>,
    generator: ResponseGenerator,
    synthesizer: SpeechSynthesizer,
}

impl TurnOrchestrator {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        generator: ResponseGenerator,
        synthesizer: SpeechSynthesizer,
    ) -> Self {
        Self {
            history,
            generator,
            synthesizer,
        }
    }

    /// Wire up the Gemini and Deepgram clients with in-memory history.
    pub fn from_config(config: &Config, keys: &ApiKeys) -> Result<Self, DebateError> {
        let model = GeminiModel::new(&config.generator, keys.generation_api_key.clone())?;
        let speech = DeepgramSpeech::new(&config.synthesizer, keys.synthesis_api_key.clone())?;

        Ok(Self::new(
            Arc::new(InMemoryHistoryStore::new()),
            ResponseGenerator::new(
                Arc::new(model),
                config.persona.clone(),
                config.generator.audio_mime_type.clone(),
            ),
            SpeechSynthesizer::new(Arc::new(speech)),
        ))
    }

    /// Process one incoming audio clip.
    ///
    /// History is only appended when both generation and synthesis succeed.
    pub async fn handle_turn(
        &self,
        conversation_id: &str,
        audio_b64: &str,
    ) -> Result<TurnReply, DebateError> {
        let history = self.history.load(conversation_id);
        debug!(conversation_id, prior_turns = history.len(), "Starting debate turn");

        let text = self.generator.generate(audio_b64, &history).await?;
        let audio = self.synthesizer.synthesize(&text).await?;

        self.history
            .save(conversation_id, audio_b64.to_string(), text.clone());
        info!(
            conversation_id,
            turn = history.len() + 1,
            response_chars = text.chars().count(),
            "Debate turn completed"
        );

        Ok(TurnReply {
            ai_response_text: text,
            ai_response_audio_base64: audio,
            conversation_id: conversation_id.to_string(),
        })
    }

    /// All stored turns for a conversation.
    ///
    /// A conversation with no turns is reported as not found, whether or not
    /// the identifier was ever used.
    pub fn get_history(&self, conversation_id: &str) -> Result<Vec<Turn>, DebateError> {
        let turns = self.history.load(conversation_id);
        if turns.is_empty() {
            return Err(DebateError::NotFound("Conversation not found".to_string()));
        }
        Ok(turns)
    }
}
