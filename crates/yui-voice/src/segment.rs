//! Sentence segmentation.
//!
//! A reply is cut immediately after every `.`, `?` and `!`, keeping the
//! terminator with the sentence it ends. Pieces are trimmed and empty pieces
//! dropped, so the result is always a contiguous, 0-based sequence of
//! non-empty [`SentenceUnit`]s.

use yui_core::SentenceUnit;

/// Characters that end a sentence.
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '?', '!'];

/// Split `text` into ordered sentence units.
///
/// Text without any terminator becomes a single unit; empty or
/// whitespace-only text yields no units at all.
#[must_use]
pub fn segment(text: &str) -> Vec<SentenceUnit> {
    text.split_inclusive(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .enumerate()
        .map(|(index, piece)| SentenceUnit::new(index, piece))
        .collect()
}
