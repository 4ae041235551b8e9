//! `yui talk`: a spoken conversation over stdin.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use yui_voice::TurnReport;

use crate::bootstrap::CliContext;
use crate::presentation::spawn_event_printer;

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Prompt(&'a str),
    Stop,
    Clear,
    Quit,
    Blank,
}

pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/stop" => Input::Stop,
        "/clear" => Input::Clear,
        "/quit" | "/exit" => Input::Quit,
        prompt => Input::Prompt(prompt),
    }
}

pub async fn execute(ctx: CliContext) -> Result<()> {
    let CliContext { session, events } = ctx;
    let printer = spawn_event_printer(events);

    eprintln!("Type a message and press Enter. /stop, /clear, /quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_turn: Option<JoinHandle<TurnReport>> = None;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_input(&line) {
            Input::Prompt(prompt) => last_turn = Some(session.submit(prompt)),
            Input::Stop => session.cancel(),
            Input::Clear => {
                session.cancel();
                session.clear_history();
                eprintln!("(conversation cleared)");
            }
            Input::Quit => {
                session.cancel();
                last_turn = None;
                break;
            }
            Input::Blank => {}
        }
    }

    // Let the final reply finish speaking when stdin closes.
    if let Some(turn) = last_turn {
        let report = turn.await.context("turn task panicked")?;
        tracing::debug!(turn = %report.turn, outcome = ?report.outcome, "Last turn finished");
    }

    drop(session);
    let _ = printer.await;
    Ok(())
}
