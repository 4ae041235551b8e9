//! # yui-cli
//!
//! Terminal front end for the streaming speech session: `yui talk` holds a
//! spoken conversation over stdin, `yui say` speaks a single text.

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap, init_tracing};
pub use commands::Commands;
pub use parser::{BackendArgs, Cli};
