//! HTTP adapters for the backend ports defined in `yui-core`.
//!
//! Both adapters speak the OpenAI-compatible wire format, which covers hosted
//! providers as well as local servers such as `llama-server` and Kokoro-FastAPI.

mod openai;
mod speech;

pub use openai::OpenAiChatBackend;
pub use speech::HttpSpeechBackend;

use std::time::Duration;

use yui_core::BackendError;

/// Build a client with the configured request timeout.
fn http_client(timeout_secs: u64) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Transport(e.to_string()))
}

/// `{base}/{path}` without doubled slashes.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Map a non-success response to [`BackendError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

fn transport(e: &reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/v1/", "chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:8880/v1", "audio/speech"),
            "http://localhost:8880/v1/audio/speech"
        );
    }
}
