//! Speech synthesis for generated rebuttals.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

use crate::config::SynthesizerConfig;
use crate::error::DebateError;

/// Longest text handed to the provider, in characters. Deepgram caps input
/// at 2000; the remainder is headroom.
pub const MAX_SYNTHESIS_CHARS: usize = 1990;

/// A text-to-speech backend returning encoded audio.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn speak(&self, text: &str) -> Result<Vec<u8>, DebateError>;
}

/// Turns response text into base64 audio via a [`SpeechProvider`].
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
}

impl SpeechSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self { provider }
    }

    /// Synthesize `text`, hard-truncated to [`MAX_SYNTHESIS_CHARS`].
    pub async fn synthesize(&self, text: &str) -> Result<String, DebateError> {
        let text = truncate_chars(text, MAX_SYNTHESIS_CHARS);
        let audio = self.provider.speak(text).await?;
        debug!(chars = text.chars().count(), audio_bytes = audio.len(), "Synthesized speech");
        Ok(BASE64_STANDARD.encode(audio))
    }
}

/// Cut `text` after `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// =============================================================================
// Deepgram
// =============================================================================

/// Deepgram Aura `speak` client.
#[derive(Clone)]
pub struct DeepgramSpeech {
    client: Client,
    api_key: String,
    api_base: String,
    voice_model: String,
}

impl DeepgramSpeech {
    pub fn new(config: &SynthesizerConfig, api_key: impl Into<String>) -> Result<Self, DebateError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DebateError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            voice_model: config.voice_model.clone(),
        })
    }
}

#[async_trait]
impl SpeechProvider for DeepgramSpeech {
    async fn speak(&self, text: &str) -> Result<Vec<u8>, DebateError> {
        let response = self
            .client
            .post(format!("{}/v1/speak", self.api_base))
            .query(&[("model", self.voice_model.as_str())])
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| DebateError::Synthesis {
                status: None,
                message: format!(
                    "Error during Text-to-Speech conversion with Deepgram: {}",
                    e
                ),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Deepgram API Error: {} - {}", status.as_u16(), body);
            return Err(DebateError::Synthesis {
                status: Some(status.as_u16()),
                message: format!("Deepgram API Error: {} - {}", status.as_u16(), body),
            });
        }

        let audio = response.bytes().await.map_err(|e| DebateError::Synthesis {
            status: None,
            message: format!("Failed to read Deepgram audio: {}", e),
        })?;

        Ok(audio.to_vec())
    }
}
