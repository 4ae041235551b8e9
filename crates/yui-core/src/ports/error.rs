//! Backend error type shared by both ports.

use thiserror::Error;

/// Failure reported by a text or synthesis backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered successfully but the payload was unusable.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether the failure happened before any response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
