//! Session controller: turns, cancellation, and the streaming loop.
//!
//! ```text
//!   Idle → AwaitingReply → Streaming → Idle
//!            │ (error)                  ▲
//!            └──────────────────────────┘
//! ```
//!
//! Every prompt starts a new turn. Starting a turn cancels the previous one
//! and stops its audio at once; the new turn does not wait for the old turn's
//! network calls to settle. Each turn runs on its own task and is the only
//! writer of its [`PlaybackQueue`]: synthesis results reach it over a channel
//! and it wakes on arrival, on playback end, or on cancellation.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use yui_core::{ChatMessage, Settings, TextBackend, TurnId};

use crate::error::VoiceError;
use crate::events::{EventEmitter, SessionState, SpeechStatus, VoiceEvent};
use crate::player::{AudioOutput, PlaybackOutcome, Player};
use crate::queue::{PlaybackQueue, Release};
use crate::segment::segment;
use crate::synthesis::SynthesisPool;
use crate::text_utils::prepare_for_speech;

// ── Configuration ──────────────────────────────────────────────────

/// Behaviour switches for a [`SessionController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Clean markdown and reasoning blocks out of replies before segmenting.
    pub strip_markdown: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strip_markdown: true,
        }
    }
}

impl From<&Settings> for SessionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            strip_markdown: settings.strip_markdown,
        }
    }
}

// ── Turn results ───────────────────────────────────────────────────

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Every sentence was played or skipped.
    Completed,

    /// Superseded by a newer turn or stopped with [`SessionController::cancel`].
    Cancelled,

    /// The text backend failed; nothing was spoken.
    Failed(String),
}

/// Summary returned by every turn task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: TurnId,
    pub outcome: TurnOutcome,

    /// Sentence indices handed to the player, in playback order.
    pub played: Vec<usize>,

    /// Sentence indices whose synthesis failed.
    pub skipped: Vec<usize>,
}

impl TurnReport {
    fn new(turn: TurnId, outcome: TurnOutcome) -> Self {
        Self {
            turn,
            outcome,
            played: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

// ── Controller ─────────────────────────────────────────────────────

struct TurnSlot {
    state: SessionState,
    turn: TurnId,
    cancel: CancellationToken,
}

struct Inner {
    text: Arc<dyn TextBackend>,
    pool: SynthesisPool,
    player: Player,
    events: Arc<EventEmitter>,
    config: SessionConfig,
    /// Lock order: `slot` before `history`.
    slot: Mutex<TurnSlot>,
    history: Mutex<Vec<ChatMessage>>,
}

/// Drives request/response turns from prompt to spoken audio.
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Create a session and the event receiver the UI should drain.
    pub fn new(
        text: Arc<dyn TextBackend>,
        pool: SynthesisPool,
        output: Arc<dyn AudioOutput>,
        config: SessionConfig,
    ) -> (Self, tokio::sync::mpsc::UnboundedReceiver<VoiceEvent>) {
        let (events, rx) = EventEmitter::channel();
        let events = Arc::new(events);
        let player = Player::new(output, Arc::clone(&events));

        let inner = Inner {
            text,
            pool,
            player,
            events,
            config,
            slot: Mutex::new(TurnSlot {
                state: SessionState::Idle,
                turn: TurnId::default(),
                cancel: CancellationToken::new(),
            }),
            history: Mutex::new(Vec::new()),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    /// Start a turn for a user prompt.
    ///
    /// The prompt joins the history, the text backend is asked for a reply,
    /// and the reply is spoken sentence by sentence. Any turn still running
    /// is cancelled first.
    pub fn submit(&self, prompt: impl Into<String>) -> JoinHandle<TurnReport> {
        let prompt = ChatMessage::user(prompt);
        let (turn, cancel) = self.inner.begin_turn(SessionState::AwaitingReply, Some(prompt));
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_prompt_turn(turn, cancel).await })
    }

    /// Start a turn that speaks `text` directly, skipping the text backend.
    pub fn speak(&self, text: impl Into<String>) -> JoinHandle<TurnReport> {
        let text = text.into();
        let (turn, cancel) = self.inner.begin_turn(SessionState::Streaming, None);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.stream(turn, &text, cancel).await })
    }

    /// Cancel the current turn, silence the speaker, and go idle.
    pub fn cancel(&self) {
        {
            let mut slot = self.inner.lock_slot();
            slot.cancel.cancel();
            self.inner.set_state(&mut slot, SessionState::Idle);
        }
        self.inner.player.stop();
        tracing::info!("Session cancelled");
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.inner.lock_slot().state
    }

    /// Identifier of the most recently started turn.
    pub fn current_turn(&self) -> TurnId {
        self.inner.lock_slot().turn
    }

    /// Caption and busy flag as last reported to the UI.
    pub fn status(&self) -> SpeechStatus {
        self.inner.events.status()
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.inner.history_snapshot()
    }

    /// Forget the conversation. The running turn, if any, is unaffected.
    pub fn clear_history(&self) {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Concurrency bound of the synthesis pool.
    pub fn max_concurrent_synthesis(&self) -> usize {
        self.inner.pool.max_concurrent()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.inner.lock_slot();
        f.debug_struct("SessionController")
            .field("state", &slot.state)
            .field("turn", &slot.turn)
            .field("pool", &self.inner.pool)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn lock_slot(&self) -> std::sync::MutexGuard<'_, TurnSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, slot: &mut TurnSlot, state: SessionState) {
        if slot.state != state {
            tracing::debug!(from = ?slot.state, to = ?state, "Session state transition");
            slot.state = state;
            self.events.emit(VoiceEvent::StateChanged(state));
        }
        self.events.set_busy(state == SessionState::AwaitingReply);
    }

    /// Supersede the running turn and allocate a new one.
    fn begin_turn(
        &self,
        state: SessionState,
        prompt: Option<ChatMessage>,
    ) -> (TurnId, CancellationToken) {
        let (turn, cancel) = {
            let mut slot = self.lock_slot();
            slot.cancel.cancel();
            slot.cancel = CancellationToken::new();
            slot.turn = slot.turn.next();
            if let Some(prompt) = prompt {
                self.history
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(prompt);
            }
            self.set_state(&mut slot, state);
            (slot.turn, slot.cancel.clone())
        };

        self.player.stop();
        tracing::info!(turn = %turn, ?state, "Turn started");
        (turn, cancel)
    }

    fn is_current(slot: &TurnSlot, turn: TurnId) -> bool {
        slot.turn == turn && !slot.cancel.is_cancelled()
    }

    async fn run_prompt_turn(&self, turn: TurnId, cancel: CancellationToken) -> TurnReport {
        let history = self.history_snapshot();

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return cancelled(TurnReport::new(turn, TurnOutcome::Cancelled)),
            reply = self.text.generate(&history) => reply,
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                let error = VoiceError::TextBackend(e);
                tracing::warn!(turn = %turn, error = %error, "Reply generation failed");
                return self.finish(TurnReport::new(turn, TurnOutcome::Failed(error.to_string())));
            }
        };

        if !self.commit_reply(turn, &reply) {
            return cancelled(TurnReport::new(turn, TurnOutcome::Cancelled));
        }

        self.stream(turn, &reply, cancel).await
    }

    /// Record the reply and move to `Streaming`, unless the turn was superseded.
    fn commit_reply(&self, turn: TurnId, reply: &str) -> bool {
        let mut slot = self.lock_slot();
        if !Self::is_current(&slot, turn) {
            tracing::debug!(turn = %turn, "Dropping reply of superseded turn");
            return false;
        }

        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ChatMessage::assistant(reply));
        self.set_state(&mut slot, SessionState::Streaming);
        self.events.emit(VoiceEvent::Reply {
            turn,
            text: reply.to_string(),
        });
        true
    }

    /// Segment, synthesize, and play `text` in order.
    async fn stream(&self, turn: TurnId, text: &str, cancel: CancellationToken) -> TurnReport {
        let spoken = if self.config.strip_markdown {
            prepare_for_speech(text)
        } else {
            text.to_string()
        };
        let sentences = segment(&spoken);
        tracing::info!(turn = %turn, sentences = sentences.len(), "Streaming reply");

        let mut report = TurnReport::new(turn, TurnOutcome::Completed);
        let mut queue = PlaybackQueue::new(sentences.len());
        if queue.is_drained() {
            return self.finish(report);
        }
        let mut results = self.pool.submit_all(turn, sentences, cancel.clone());

        loop {
            match queue.next_ready() {
                Release::Ready(unit) => {
                    let index = unit.index;
                    if self.player.play(turn, unit, &cancel).await == PlaybackOutcome::Cancelled {
                        report.outcome = TurnOutcome::Cancelled;
                        return cancelled(report);
                    }
                    report.played.push(index);
                }
                Release::Skipped(failure) => {
                    if cancel.is_cancelled() {
                        report.outcome = TurnOutcome::Cancelled;
                        return cancelled(report);
                    }
                    self.events.emit(VoiceEvent::SentenceSkipped {
                        turn,
                        index: failure.index,
                        reason: failure.error.to_string(),
                    });
                    report.skipped.push(failure.index);
                }
                Release::Pending => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            report.outcome = TurnOutcome::Cancelled;
                            return cancelled(report);
                        }
                        next = results.recv() => match next {
                            Some(result) => queue.push(result),
                            None => {
                                tracing::warn!(
                                    turn = %turn,
                                    next = queue.next_index(),
                                    "Synthesis results ended early"
                                );
                                queue.abandon_missing();
                            }
                        },
                    }
                }
                Release::Drained => break,
            }
        }

        if cancel.is_cancelled() {
            report.outcome = TurnOutcome::Cancelled;
            return cancelled(report);
        }
        self.finish(report)
    }

    /// Return to `Idle` if this turn still owns the session.
    fn finish(&self, report: TurnReport) -> TurnReport {
        let mut slot = self.lock_slot();
        if !Self::is_current(&slot, report.turn) {
            drop(slot);
            return cancelled(TurnReport {
                outcome: TurnOutcome::Cancelled,
                ..report
            });
        }

        match &report.outcome {
            TurnOutcome::Failed(message) => self.events.emit(VoiceEvent::Error {
                turn: report.turn,
                message: message.clone(),
            }),
            _ => self.events.emit(VoiceEvent::TurnCompleted {
                turn: report.turn,
                played: report.played.len(),
                skipped: report.skipped.len(),
            }),
        }
        self.set_state(&mut slot, SessionState::Idle);
        drop(slot);

        tracing::info!(
            turn = %report.turn,
            outcome = ?report.outcome,
            played = report.played.len(),
            skipped = report.skipped.len(),
            "Turn finished"
        );
        report
    }
}

fn cancelled(report: TurnReport) -> TurnReport {
    tracing::debug!(
        turn = %report.turn,
        played = report.played.len(),
        "Turn cancelled"
    );
    report
}
