//! Speech synthesis port.

use async_trait::async_trait;

use super::BackendError;

/// Turns one sentence of text into encoded audio bytes.
///
/// The bytes are opaque to the caller until they are handed to a decoder.
/// Each call is a single attempt; the scheduler never retries.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError>;
}
