//! Terminal rendering of session events.
//!
//! Captions go to stdout; warnings and errors go to stderr so they never mix
//! with piped output.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use yui_voice::VoiceEvent;

/// Where a rendered line belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Out(String),
    Err(String),
}

/// Render one event, or `None` for events the terminal does not show.
pub fn render(event: &VoiceEvent) -> Option<Line> {
    match event {
        VoiceEvent::SentenceStarted { text, .. } => Some(Line::Out(format!("yui: {text}"))),
        VoiceEvent::SentenceSkipped { index, reason, .. } => Some(Line::Err(format!(
            "warning: sentence {} skipped ({reason})",
            index + 1
        ))),
        VoiceEvent::Error { message, .. } => Some(Line::Err(format!("error: {message}"))),
        VoiceEvent::StateChanged(_)
        | VoiceEvent::Status(_)
        | VoiceEvent::Reply { .. }
        | VoiceEvent::TurnCompleted { .. } => None,
    }
}

/// Print events until the session is dropped.
pub fn spawn_event_printer(mut events: UnboundedReceiver<VoiceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match render(&event) {
                Some(Line::Out(line)) => println!("{line}"),
                Some(Line::Err(line)) => eprintln!("{line}"),
                None => {}
            }
        }
    })
}
