//! Core domain types.
//!
//! These types represent the pure domain model, independent of any
//! infrastructure concerns (HTTP, audio devices, etc.).
//!
//! # Structure
//!
//! - `chat` - Conversation history messages and roles
//! - `speech` - Sentence units and turn identifiers

pub mod chat;
pub mod speech;

pub use chat::{ChatMessage, MessageRole};
pub use speech::{SentenceUnit, TurnId};
