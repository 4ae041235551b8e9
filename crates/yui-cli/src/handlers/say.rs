//! `yui say`: speak one text and exit.

use anyhow::{Context, Result, bail};
use yui_voice::TurnOutcome;

use crate::bootstrap::CliContext;
use crate::presentation::spawn_event_printer;

pub async fn execute(ctx: CliContext, text: &str) -> Result<()> {
    let CliContext { session, events } = ctx;
    let printer = spawn_event_printer(events);

    let report = session
        .speak(text)
        .await
        .context("speech task panicked")?;

    drop(session);
    let _ = printer.await;

    match report.outcome {
        TurnOutcome::Completed if report.played.is_empty() && !report.skipped.is_empty() => {
            bail!("no sentence could be synthesized")
        }
        TurnOutcome::Completed | TurnOutcome::Cancelled => Ok(()),
        TurnOutcome::Failed(message) => bail!(message),
    }
}
