//! Port definitions (trait abstractions) for external services.
//!
//! The scheduler talks to exactly two remote collaborators: a text backend
//! that produces the assistant reply, and a synthesis backend that turns one
//! sentence into encoded audio bytes. Both are opaque; their wire formats are
//! the adapters' business.
//!
//! # Design Rules
//!
//! - No HTTP client types in any signature
//! - Implementations must be `Send + Sync` so they can be shared behind `Arc`
//!   across spawned synthesis tasks
//! - No retries at this layer: one call is one attempt

mod error;
mod synthesis;
mod text;

pub use error::BackendError;
pub use synthesis::SynthesisBackend;
pub use text::TextBackend;
