//! DebateRelay Core Library
//!
//! Turns a spoken audio clip into a spoken AI rebuttal: conversation history,
//! rebuttal generation, speech synthesis, and the turn pipeline tying them together.

pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod orchestrator;
pub mod synthesizer;

pub use config::{ApiKeys, Config};
pub use error::DebateError;
pub use generator::{GeminiModel, LanguageModel, ModelReply, ResponseGenerator};
pub use history::{HistoryStore, InMemoryHistoryStore, Turn};
pub use orchestrator::{TurnOrchestrator, TurnReply};
pub use synthesizer::{DeepgramSpeech, MAX_SYNTHESIS_CHARS, SpeechProvider, SpeechSynthesizer};
