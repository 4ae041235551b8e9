//! Command handlers.
//!
//! Handlers take the composed [`CliContext`](crate::CliContext), drive the
//! session, and format results for the terminal. They contain no scheduling
//! logic of their own.

pub mod say;
pub mod talk;
