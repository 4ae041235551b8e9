//! Single-voice player.
//!
//! The [`Player`] owns the audio output for the life of the session and plays
//! one [`AudioUnit`] at a time. Starting a unit stops whatever was playing,
//! the caption follows the unit being played, and a unit whose output fails
//! resolves immediately as if it had zero length.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use yui_core::TurnId;

use crate::decode::DecodedAudio;
use crate::error::VoiceError;
use crate::events::{EventEmitter, VoiceEvent};
use crate::synthesis::AudioUnit;

// ── Output port ────────────────────────────────────────────────────

/// Resolves when the buffer passed to [`AudioOutput::play`] has finished.
///
/// A sender dropped without sending means playback was cut short.
pub type PlaybackDone = oneshot::Receiver<()>;

/// A device that can play one buffer at a time.
pub trait AudioOutput: Send + Sync {
    /// Start playing `audio`, replacing anything already playing.
    fn play(&self, audio: DecodedAudio) -> Result<PlaybackDone, VoiceError>;

    /// Stop playback immediately. A no-op when idle.
    fn stop(&self);
}

/// Output that plays nothing but takes as long as the audio would.
///
/// Used when running muted and in tests, where tokio's paused clock makes the
/// "playback" durations virtual.
#[derive(Debug, Default)]
pub struct SilentOutput {
    current: Mutex<Option<JoinHandle<()>>>,
}

impl SilentOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for SilentOutput {
    fn play(&self, audio: DecodedAudio) -> Result<PlaybackDone, VoiceError> {
        let (done_tx, done_rx) = oneshot::channel();
        let duration = audio.duration();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = done_tx.send(());
        });

        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(done_rx)
    }

    fn stop(&self) {
        if let Some(handle) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

// ── Player ─────────────────────────────────────────────────────────

/// How a call to [`Player::play`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The unit played to the end, was cut off by another unit, or could not
    /// be played at all.
    Finished,

    /// The owning turn was cancelled before or during playback.
    Cancelled,
}

struct PlayerState {
    /// Bumped every time a unit starts; lets a finishing unit tell whether it
    /// still owns the caption.
    generation: u64,
}

/// Plays audio units one at a time and keeps the caption in sync.
pub struct Player {
    output: Arc<dyn AudioOutput>,
    events: Arc<EventEmitter>,
    state: Mutex<PlayerState>,
}

impl Player {
    pub fn new(output: Arc<dyn AudioOutput>, events: Arc<EventEmitter>) -> Self {
        Self {
            output,
            events,
            state: Mutex::new(PlayerState { generation: 0 }),
        }
    }

    /// Play `unit` for `turn`, resolving when it ends.
    ///
    /// Nothing is started if `cancel` has already fired. The cancellation
    /// check and the start happen under one lock, so a turn cancelled by
    /// [`SessionController`](crate::session::SessionController) can never
    /// start audio over its successor.
    pub async fn play(
        &self,
        turn: TurnId,
        unit: AudioUnit,
        cancel: &CancellationToken,
    ) -> PlaybackOutcome {
        let AudioUnit { index, text, audio } = unit;

        let (done, generation) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if cancel.is_cancelled() {
                return PlaybackOutcome::Cancelled;
            }

            self.output.stop();
            if audio.is_empty() {
                tracing::warn!(turn = %turn, index, "Empty audio buffer, skipping playback");
                return PlaybackOutcome::Finished;
            }

            let done = match self.output.play(audio) {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!(turn = %turn, index, error = %e, "Audio output failed");
                    return PlaybackOutcome::Finished;
                }
            };

            state.generation += 1;
            self.events.set_now_speaking(Some(text.clone()));
            self.events.emit(VoiceEvent::SentenceStarted { turn, index, text });
            (done, state.generation)
        };

        tracing::debug!(turn = %turn, index, "Playback started");

        let outcome = tokio::select! {
            _ = done => PlaybackOutcome::Finished,
            () = cancel.cancelled() => {
                // A successor may already own the output; leave it alone.
                let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                if state.generation == generation {
                    self.output.stop();
                }
                PlaybackOutcome::Cancelled
            }
        };

        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == generation {
            self.events.set_now_speaking(None);
        }
        drop(state);

        tracing::debug!(turn = %turn, index, ?outcome, "Playback ended");
        outcome
    }

    /// Stop whatever is playing and clear the caption.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.output.stop();
        state.generation += 1;
        self.events.set_now_speaking(None);
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player").finish_non_exhaustive()
    }
}
