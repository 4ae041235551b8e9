//! OpenAI-compatible speech synthesis adapter.

use async_trait::async_trait;
use serde::Serialize;
use yui_core::{BackendError, SpeechBackendSettings, SynthesisBackend};

use super::{check_status, endpoint, http_client, transport};

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// [`SynthesisBackend`] that calls `POST {base}/audio/speech`.
///
/// The response body is returned untouched; decoding happens in the pool.
#[derive(Debug, Clone)]
pub struct HttpSpeechBackend {
    client: reqwest::Client,
    settings: SpeechBackendSettings,
}

impl HttpSpeechBackend {
    pub fn new(settings: SpeechBackendSettings) -> Result<Self, BackendError> {
        let client = http_client(settings.timeout_secs)?;
        Ok(Self { client, settings })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.settings.model,
            input: text,
            voice: &self.settings.voice,
            response_format: &self.settings.response_format,
        }
    }
}

#[async_trait]
impl SynthesisBackend for HttpSpeechBackend {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let url = endpoint(&self.settings.base_url, "audio/speech");
        tracing::trace!(%url, chars = text.len(), "Requesting speech");

        let mut request = self.client.post(&url).json(&self.request_body(text));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| transport(&e))?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await.map_err(|e| transport(&e))?;
        Ok(bytes.to_vec())
    }
}
