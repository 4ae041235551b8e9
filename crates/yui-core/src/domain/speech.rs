//! Speech scheduling domain types.

use serde::{Deserialize, Serialize};

/// One sentence of a reply, tagged with its position.
///
/// Indices within a turn start at 0 and are contiguous. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceUnit {
    pub index: usize,
    pub text: String,
}

impl SentenceUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Monotonically increasing identifier of one request/response turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TurnId(pub u64);

impl TurnId {
    /// The identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
