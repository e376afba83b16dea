//! Rebuttal generation.
//!
//! Builds the debate prompt from the persona and prior AI replies, attaches
//! the caller's audio clip, and asks a speech-capable model for a response.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{GeneratorConfig, PersonaConfig};
use crate::error::DebateError;
use crate::history::Turn;

/// Finish reasons that mean the model withheld its output for moderation.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// What came back from a single model invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    /// Set when the provider's moderation layer refused the request.
    pub block_reason: Option<String>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            block_reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            block_reason: Some(reason.into()),
        }
    }
}

/// A generative model that understands a text prompt plus one audio clip.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<ModelReply, DebateError>;
}

/// Produces the AI's textual rebuttal for an incoming audio clip.
pub struct ResponseGenerator {
    model: Arc<dyn LanguageModel>,
    persona: PersonaConfig,
    audio_mime_type: String,
}

impl ResponseGenerator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        persona: PersonaConfig,
        audio_mime_type: impl Into<String>,
    ) -> Self {
        Self {
            model,
            persona,
            audio_mime_type: audio_mime_type.into(),
        }
    }

    /// Generate a reply to `audio_b64`, given the conversation so far.
    pub async fn generate(&self, audio_b64: &str, history: &[Turn]) -> Result<String, DebateError> {
        let audio = decode_audio(audio_b64)?;
        let prompt = build_prompt(&self.persona, history);

        debug!(
            audio_bytes = audio.len(),
            prior_turns = history.len(),
            "Requesting rebuttal from model"
        );

        let reply = self
            .model
            .generate(&prompt, &audio, &self.audio_mime_type)
            .await?;

        if let Some(reason) = reply.block_reason {
            warn!("Model blocked the request: {}", reason);
            return Err(DebateError::BlockedContent { reason });
        }

        Ok(reply.text)
    }
}

/// Persona, then one `AI: ...` line per prior reply, then the closing instruction.
///
/// The caller's earlier audio is not replayed to the model; only the AI's own
/// prior responses are summarized.
pub fn build_prompt(persona: &PersonaConfig, history: &[Turn]) -> String {
    let summary = history
        .iter()
        .map(|turn| format!("AI: {}", turn.ai_response))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n{}\n{}",
        persona.prompt, summary, persona.closing_instruction
    )
}

/// Decode the caller's base64 audio (standard alphabet, padded).
///
/// ASCII whitespace anywhere in the input is ignored, so MIME-style
/// line-wrapped payloads decode the same as single-line ones.
pub fn decode_audio(audio_b64: &str) -> Result<Vec<u8>, DebateError> {
    let result = if audio_b64.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = audio_b64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        BASE64_STANDARD.decode(compact)
    } else {
        BASE64_STANDARD.decode(audio_b64)
    };

    result.map_err(|e| DebateError::Decode(e.to_string()))
}

// =============================================================================
// Gemini
// =============================================================================

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiModel {
    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Result<Self, DebateError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DebateError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<ModelReply, DebateError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64_STANDARD.encode(audio),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DebateError::Generation(format!("Gemini API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(DebateError::Generation(format!(
                "{} - {}",
                status.as_u16(),
                describe_error_body(&body)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DebateError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        interpret_response(parsed)
    }
}

fn interpret_response(response: GenerateContentResponse) -> Result<ModelReply, DebateError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Ok(ModelReply::blocked(reason));
    }

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .ok_or_else(|| DebateError::Generation("Gemini API returned no candidates".to_string()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return match candidate.finish_reason {
            Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                Ok(ModelReply::blocked(reason))
            }
            other => Err(DebateError::Generation(format!(
                "Gemini API returned no text (finish reason: {})",
                other.as_deref().unwrap_or("unknown")
            ))),
        };
    }

    Ok(ModelReply::text(text))
}

fn describe_error_body(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let message = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{}: {}", status, message),
                _ => message,
            })
        })
        .unwrap_or_else(|| body.to_string())
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn persona() -> PersonaConfig {
        PersonaConfig {
            prompt: "PERSONA".to_string(),
            closing_instruction: "RESPOND:".to_string(),
        }
    }

    fn gemini_config(api_base: &str) -> GeneratorConfig {
        GeneratorConfig {
            api_base: api_base.to_string(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_build_prompt_without_history() {
        assert_eq!(build_prompt(&persona(), &[]), "PERSONA\n\nRESPOND:");
    }

    #[test]
    fn test_build_prompt_summarizes_ai_replies_only() {
        let history = vec![
            Turn::new("dXNlciBvbmU=", "Humans are slow."),
            Turn::new("dXNlciB0d28=", "Data beats gut feeling."),
        ];
        let prompt = build_prompt(&persona(), &history);

        assert_eq!(
            prompt,
            "PERSONA\nAI: Humans are slow.\nAI: Data beats gut feeling.\nRESPOND:"
        );
        assert!(!prompt.contains("dXNlciBvbmU="));
    }

    #[test]
    fn test_decode_audio_rejects_garbage() {
        let err = decode_audio("not-base64!!").unwrap_err();
        assert!(matches!(err, DebateError::Decode(_)));
    }

    #[test]
    fn test_decode_audio_accepts_padded_input() {
        assert_eq!(decode_audio(" aGVsbG8= \n").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_audio_accepts_line_wrapped_input() {
        let wrapped = "aGVsbG8g\r\nYXVkaWVu\nY2U=\n";
        assert_eq!(decode_audio(wrapped).unwrap(), b"hello audience");
    }

    #[test]
    fn test_interpret_prompt_feedback_block() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert_eq!(
            interpret_response(parsed).unwrap(),
            ModelReply::blocked("SAFETY")
        );
    }

    #[test]
    fn test_interpret_safety_finish_without_text() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "PROHIBITED_CONTENT" }]
        }))
        .unwrap();
        assert_eq!(
            interpret_response(parsed).unwrap().block_reason.as_deref(),
            Some("PROHIBITED_CONTENT")
        );
    }

    #[test]
    fn test_interpret_joins_text_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "AI ships " }, { "text": "faster." }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(
            interpret_response(parsed).unwrap(),
            ModelReply::text("AI ships faster.")
        );
    }

    #[test]
    fn test_interpret_empty_response_is_generation_error() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            interpret_response(parsed),
            Err(DebateError::Generation(_))
        ));
    }

    #[test]
    fn test_describe_error_body_prefers_structured_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(describe_error_body(body), "RESOURCE_EXHAUSTED: Quota exceeded");
        assert_eq!(describe_error_body("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_gemini_model_sends_prompt_and_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "PROMPT" },
                        { "inlineData": { "mimeType": "audio/webm", "data": "aGVsbG8=" } }
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Rebuttal." }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = GeminiModel::new(&gemini_config(&server.uri()), "test-key").unwrap();
        let reply = model.generate("PROMPT", b"hello", "audio/webm").await.unwrap();

        assert_eq!(reply, ModelReply::text("Rebuttal."));
    }

    #[tokio::test]
    async fn test_gemini_model_maps_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let model = GeminiModel::new(&gemini_config(&server.uri()), "").unwrap();
        let err = model.generate("PROMPT", b"hello", "audio/webm").await.unwrap_err();

        match err {
            DebateError::Generation(message) => {
                assert!(message.contains("403"));
                assert!(message.contains("API key not valid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generator_surfaces_block_reason() {
        struct Blocking;

        #[async_trait]
        impl LanguageModel for Blocking {
            async fn generate(&self, _: &str, _: &[u8], _: &str) -> Result<ModelReply, DebateError> {
                Ok(ModelReply::blocked("SAFETY"))
            }
        }

        let generator = ResponseGenerator::new(Arc::new(Blocking), persona(), "audio/webm");
        let err = generator.generate("aGVsbG8=", &[]).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("SAFETY"));
    }
}
