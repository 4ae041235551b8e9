//! # yui-voice
//!
//! Speaks assistant replies sentence by sentence while the rest of the reply
//! is still being synthesized.
//!
//! ```text
//!   reply ─▶ segment ─▶ SynthesisPool (≤ K calls) ─▶ PlaybackQueue ─▶ Player
//!                                       completion order    index order
//! ```
//!
//! [`SessionController`] ties the pieces together per turn and owns
//! cancellation: a new prompt silences the previous reply immediately.

pub mod backend;
pub mod decode;
pub mod error;
pub mod events;
pub mod playback;
pub mod player;
pub mod queue;
pub mod segment;
pub mod session;
pub mod synthesis;
pub mod text_utils;

// Re-export key types for convenience
pub use backend::{HttpSpeechBackend, OpenAiChatBackend};
pub use decode::{AudioDecoder, DecodedAudio, WavDecoder};
pub use error::{SynthesisFailure, VoiceError};
pub use events::{EventEmitter, SessionState, SpeechStatus, VoiceEvent};
pub use playback::RodioOutput;
pub use player::{AudioOutput, PlaybackOutcome, Player, SilentOutput};
pub use queue::{PlaybackQueue, Release};
pub use segment::segment;
pub use session::{SessionConfig, SessionController, TurnOutcome, TurnReport};
pub use synthesis::{AudioUnit, SynthesisPool, SynthesisResult};
