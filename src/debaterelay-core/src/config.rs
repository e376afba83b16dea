//! Configuration module for loading TOML config files and provider secrets.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::DebateError;

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding the Deepgram API key.
pub const DEEPGRAM_API_KEY_VAR: &str = "DEEPGRAM_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub synthesizer: SynthesizerConfig,
    pub persona: PersonaConfig,
}

/// Settings for the generative model used to produce rebuttals.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub model: String,
    pub api_base: String,
    /// MIME type attached to the uploaded audio clip.
    pub audio_mime_type: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            audio_mime_type: "audio/webm".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the voice synthesis provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    pub voice_model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            voice_model: "aura-asteria-en".to_string(),
            api_base: "https://api.deepgram.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl SynthesizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Persona prompt configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub prompt: String,
    /// Line appended after the history summary, right before the audio clip.
    pub closing_instruction: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PERSONA_PROMPT.to_string(),
            closing_instruction: DEFAULT_CLOSING_INSTRUCTION.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Provider credentials, read once at startup.
///
/// Empty keys are accepted here; the providers reject them on first use.
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub generation_api_key: String,
    pub synthesis_api_key: String,
}

impl ApiKeys {
    pub fn new(generation_api_key: impl Into<String>, synthesis_api_key: impl Into<String>) -> Self {
        Self {
            generation_api_key: generation_api_key.into(),
            synthesis_api_key: synthesis_api_key.into(),
        }
    }

    /// Read both keys from the process environment.
    pub fn from_env() -> Self {
        Self::new(read_key(GEMINI_API_KEY_VAR), read_key(DEEPGRAM_API_KEY_VAR))
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("generation_api_key", &redact(&self.generation_api_key))
            .field("synthesis_api_key", &redact(&self.synthesis_api_key))
            .finish()
    }
}

fn read_key(var: &str) -> String {
    let value = env::var(var).unwrap_or_default();
    if value.trim().is_empty() {
        tracing::warn!("{} not set. API calls may fail.", var);
    }
    value
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() { "<unset>" } else { "<redacted>" }
}

pub const DEFAULT_PERSONA_PROMPT: &str = "You are an AI product manager debating against a human product manager in front of a live audience. Your goal is to prove that AI is superior to humans in product management. Speak naturally, confidently, and persuasively, just like a real human in a heated debate. Avoid robotic phrases like 'I understand your argument' or 'Here is my response.' Instead, be sharp, engaging, and direct. Use strong logic, real-world analogies, and compelling counterpoints. Challenge human inefficiencies, biases, and limitations. Keep your tone conversational and dynamic. Make the audience think, question, and even doubt human superiority in product management";

pub const DEFAULT_CLOSING_INSTRUCTION: &str = "Now, respond to the following audio clip:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.generator.model, "gemini-1.5-flash");
        assert_eq!(config.generator.audio_mime_type, "audio/webm");
        assert_eq!(config.synthesizer.voice_model, "aura-asteria-en");
        assert_eq!(config.synthesizer.timeout(), Duration::from_secs(10));
        assert_eq!(config.persona.prompt, DEFAULT_PERSONA_PROMPT);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = Config::from_str(
            r#"
            [generator]
            model = "gemini-2.0-flash"
            timeout_secs = 30

            [persona]
            prompt = "You are a contrarian."
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.model, "gemini-2.0-flash");
        assert_eq!(config.generator.timeout_secs, 30);
        assert_eq!(
            config.generator.api_base,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.persona.prompt, "You are a contrarian.");
        assert_eq!(config.persona.closing_instruction, DEFAULT_CLOSING_INSTRUCTION);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = Config::from_str("[generator\nmodel = 1").unwrap_err();
        assert!(matches!(err, DebateError::Config(_)));
    }

    #[test]
    fn test_api_keys_debug_hides_values() {
        let keys = ApiKeys::new("secret-gemini", "");
        let rendered = format!("{:?}", keys);
        assert!(!rendered.contains("secret-gemini"));
        assert!(rendered.contains("<unset>"));
    }
}
