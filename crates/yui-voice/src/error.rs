//! Speech scheduler error types.

use yui_core::BackendError;

/// Errors that can occur while producing or playing speech.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VoiceError {
    /// Reply generation failed; the whole turn is aborted.
    #[error("Reply generation failed: {0}")]
    TextBackend(BackendError),

    /// Failed to synthesize speech for a sentence.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(BackendError),

    /// Synthesized bytes could not be decoded into playable audio.
    #[error("Audio decode failed: {0}")]
    Decode(String),

    /// Failed to open or drive the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The dedicated audio thread exited unexpectedly.
    #[error("Audio thread is no longer running")]
    AudioThreadDied,

    /// Configuration rejected before any work started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The owning turn was superseded or stopped.
    #[error("Voice operation cancelled")]
    Cancelled,
}

/// A sentence that could not be turned into audio.
///
/// Carries the sentence index so the playback queue can mark that slot as
/// permanently skipped.
#[derive(Debug, Clone, thiserror::Error)]
#[error("sentence {index} failed: {error}")]
pub struct SynthesisFailure {
    pub index: usize,
    pub text: String,
    #[source]
    pub error: VoiceError,
}
