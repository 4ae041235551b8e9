//! Reply generation port.

use async_trait::async_trait;

use super::BackendError;
use crate::domain::ChatMessage;

/// Produces the assistant's reply for a conversation.
///
/// `history` is the full ordered conversation, ending with the newest user
/// message. The returned string is the complete reply; streaming partial
/// tokens is not part of this contract.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn generate(&self, history: &[ChatMessage]) -> Result<String, BackendError>;
}
