//! OpenAI-compatible chat completion adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use yui_core::{BackendError, ChatBackendSettings, ChatMessage, TextBackend};

use super::{check_status, endpoint, http_client, transport};

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ── Adapter ────────────────────────────────────────────────────────

/// [`TextBackend`] that calls `POST {base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiChatBackend {
    client: reqwest::Client,
    settings: ChatBackendSettings,
}

impl OpenAiChatBackend {
    pub fn new(settings: ChatBackendSettings) -> Result<Self, BackendError> {
        let client = http_client(settings.timeout_secs)?;
        Ok(Self { client, settings })
    }

    fn request_body<'a>(&'a self, history: &'a [ChatMessage]) -> CompletionRequest<'a> {
        let system = (!self.settings.system_prompt.trim().is_empty()).then(|| WireMessage {
            role: "system",
            content: self.settings.system_prompt.as_str(),
        });

        let messages = system
            .into_iter()
            .chain(history.iter().map(|m| WireMessage {
                role: m.role.as_str(),
                content: m.content.as_str(),
            }))
            .collect();

        CompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens: self.settings.max_tokens,
            stream: false,
        }
    }
}

fn reply_text(response: CompletionResponse) -> Result<String, BackendError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BackendError::InvalidResponse("completion has no message content".into()))
}

#[async_trait]
impl TextBackend for OpenAiChatBackend {
    async fn generate(&self, history: &[ChatMessage]) -> Result<String, BackendError> {
        let url = endpoint(&self.settings.base_url, "chat/completions");
        tracing::debug!(%url, messages = history.len(), "Requesting chat completion");

        let mut request = self.client.post(&url).json(&self.request_body(history));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| transport(&e))?;
        let response = check_status(response).await?;
        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        reply_text(parsed)
    }
}
