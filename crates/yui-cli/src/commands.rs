//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Chat interactively; every line typed on stdin starts a new turn
    ///
    /// Typing while yui is still speaking interrupts her. `/stop` silences the
    /// current reply, `/clear` forgets the conversation, `/quit` exits.
    Talk,

    /// Speak the given text and exit when done
    Say {
        /// Text to speak
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}
