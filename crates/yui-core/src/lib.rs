//! # yui-core
//!
//! Pure domain types and port definitions shared by the speech scheduler
//! (`yui-voice`) and the command-line front end (`yui-cli`).
//!
//! Nothing in this crate performs I/O. Backends for reply generation and
//! speech synthesis are described by the traits in [`ports`]; concrete HTTP
//! adapters live in `yui-voice`.

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{ChatMessage, MessageRole, SentenceUnit, TurnId};
pub use ports::{BackendError, SynthesisBackend, TextBackend};
pub use settings::{
    ChatBackendSettings, DEFAULT_MAX_CONCURRENT_SYNTHESIS, MAX_CONCURRENT_SYNTHESIS_LIMIT,
    Settings, SettingsError, SpeechBackendSettings, validate_settings,
};
