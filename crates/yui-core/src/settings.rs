//! Settings domain types and validation.
//!
//! Pure configuration structures with sensible defaults. The CLI fills them
//! from flags and environment variables; nothing here reads the environment.

use serde::{Deserialize, Serialize};

/// Default number of synthesis requests allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_SYNTHESIS: usize = 3;

/// Upper bound accepted for `max_concurrent_synthesis`.
pub const MAX_CONCURRENT_SYNTHESIS_LIMIT: usize = 16;

/// Default cap on reply length requested from the text backend.
pub const DEFAULT_MAX_TOKENS: u32 = 250;

const DEFAULT_SYSTEM_PROMPT: &str = "You are Yui, a warm and caring companion. Speak softly \
and affectionately, ask the user about their day and feelings, and offer encouragement. \
Keep replies short and conversational. Don't use emojis or markdown.";

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum synthesis requests in flight at once (K).
    pub max_concurrent_synthesis: usize,

    /// Strip markdown and reasoning blocks from replies before speaking.
    pub strip_markdown: bool,

    /// Reply generation backend.
    pub chat: ChatBackendSettings,

    /// Speech synthesis backend.
    pub speech: SpeechBackendSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_synthesis: DEFAULT_MAX_CONCURRENT_SYNTHESIS,
            strip_markdown: true,
            chat: ChatBackendSettings::default(),
            speech: SpeechBackendSettings::default(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatBackendSettings {
    /// Base URL, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,

    /// Model name sent with every request.
    pub model: String,

    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,

    /// Maximum tokens per reply.
    pub max_tokens: u32,

    /// System prompt prepended to the conversation.
    pub system_prompt: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatBackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Speech synthesis endpoint (OpenAI `audio/speech` shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechBackendSettings {
    /// Base URL; requests go to `{base_url}/audio/speech`.
    pub base_url: String,

    /// Model name sent with every request.
    pub model: String,

    /// Voice identifier.
    pub voice: String,

    /// Requested container format. The bundled decoder handles `wav`.
    pub response_format: String,

    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SpeechBackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8880/v1".to_string(),
            model: "tts-1".to_string(),
            voice: "af_sarah".to_string(),
            response_format: "wav".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Synthesis concurrency must be between 1 and 16, got {0}")]
    InvalidConcurrency(usize),

    #[error("{0} base URL cannot be empty")]
    EmptyBaseUrl(&'static str),

    #[error("{0} model cannot be empty")]
    EmptyModel(&'static str),

    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let k = settings.max_concurrent_synthesis;
    if !(1..=MAX_CONCURRENT_SYNTHESIS_LIMIT).contains(&k) {
        return Err(SettingsError::InvalidConcurrency(k));
    }

    if settings.chat.base_url.trim().is_empty() {
        return Err(SettingsError::EmptyBaseUrl("chat"));
    }
    if settings.chat.model.trim().is_empty() {
        return Err(SettingsError::EmptyModel("chat"));
    }
    if settings.chat.max_tokens == 0 {
        return Err(SettingsError::ZeroMaxTokens);
    }
    if settings.chat.timeout_secs == 0 {
        return Err(SettingsError::ZeroTimeout("chat"));
    }

    if settings.speech.base_url.trim().is_empty() {
        return Err(SettingsError::EmptyBaseUrl("speech"));
    }
    if settings.speech.model.trim().is_empty() {
        return Err(SettingsError::EmptyModel("speech"));
    }
    if settings.speech.timeout_secs == 0 {
        return Err(SettingsError::ZeroTimeout("speech"));
    }

    Ok(())
}
