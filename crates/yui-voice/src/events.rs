//! Events emitted to the UI layer.
//!
//! The scheduler never waits on its consumer: events go out over an unbounded
//! channel and a dropped receiver only produces a log line.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use yui_core::TurnId;

// ── Session state machine ──────────────────────────────────────────

/// Current state of the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No turn active.
    Idle,

    /// Text backend call in flight.
    AwaitingReply,

    /// Sentences are being synthesized and played.
    Streaming,
}

/// Snapshot pushed to the UI whenever either field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechStatus {
    /// Sentence currently being played, for captions and lip-sync.
    pub now_speaking: Option<String>,

    /// Whether a reply is being generated.
    pub is_busy: bool,
}

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by the session to the UI / application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// Session state changed.
    StateChanged(SessionState),

    /// Caption / busy indicator changed.
    Status(SpeechStatus),

    /// The text backend produced the reply for a turn.
    Reply { turn: TurnId, text: String },

    /// A sentence was handed to the audio output.
    SentenceStarted {
        turn: TurnId,
        index: usize,
        text: String,
    },

    /// A sentence could not be synthesized and was passed over.
    SentenceSkipped {
        turn: TurnId,
        index: usize,
        reason: String,
    },

    /// Every sentence of the turn was played or skipped.
    TurnCompleted {
        turn: TurnId,
        played: usize,
        skipped: usize,
    },

    /// A turn-level failure the user should see.
    Error { turn: TurnId, message: String },
}

// ── Emitter ────────────────────────────────────────────────────────

/// Shared sender that also tracks the merged [`SpeechStatus`].
///
/// The player owns `now_speaking` and the session owns `is_busy`; both write
/// through here so every `Status` event carries the full snapshot.
#[derive(Debug)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<VoiceEvent>,
    status: Mutex<SpeechStatus>,
}

impl EventEmitter {
    /// Create an emitter and the receiver the UI should drain.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<VoiceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                status: Mutex::new(SpeechStatus::default()),
            },
            rx,
        )
    }

    /// Emit an event; a dropped receiver is logged and otherwise ignored.
    pub fn emit(&self, event: VoiceEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Voice event receiver dropped");
        }
    }

    /// Current merged status.
    pub fn status(&self) -> SpeechStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Update the caption; emits only on change.
    pub fn set_now_speaking(&self, text: Option<String>) {
        self.update(|s| s.now_speaking = text);
    }

    /// Update the busy flag; emits only on change.
    pub fn set_busy(&self, busy: bool) {
        self.update(|s| s.is_busy = busy);
    }

    fn update(&self, change: impl FnOnce(&mut SpeechStatus)) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        let before = status.clone();
        change(&mut status);
        if *status != before {
            self.emit(VoiceEvent::Status(status.clone()));
        }
    }
}
