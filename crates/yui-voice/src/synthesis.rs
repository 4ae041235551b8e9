//! Synthesis worker pool.
//!
//! A turn's sentences are admitted to the synthesis backend in index order,
//! at most `K` at a time. Admission is gated by a fair semaphore shared by
//! every turn, so the bound holds even while an abandoned turn's calls are
//! still on the wire. Results are delivered over a channel in completion
//! order; the [`PlaybackQueue`](crate::queue::PlaybackQueue) restores order.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use yui_core::{SentenceUnit, SynthesisBackend, TurnId};

use crate::decode::{AudioDecoder, DecodedAudio};
use crate::error::{SynthesisFailure, VoiceError};

/// A synthesized, decoded sentence ready for the player.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUnit {
    pub index: usize,
    pub text: String,
    pub audio: DecodedAudio,
}

/// Outcome of synthesizing one sentence.
pub type SynthesisResult = Result<AudioUnit, SynthesisFailure>;

/// Bounded-concurrency front end to a [`SynthesisBackend`].
pub struct SynthesisPool {
    backend: Arc<dyn SynthesisBackend>,
    decoder: Arc<dyn AudioDecoder>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl SynthesisPool {
    /// Create a pool allowing `max_concurrent` outstanding backend calls.
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        decoder: Arc<dyn AudioDecoder>,
        max_concurrent: usize,
    ) -> Result<Self, VoiceError> {
        if max_concurrent == 0 {
            return Err(VoiceError::InvalidConfig(
                "max concurrent synthesis must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            backend,
            decoder,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        })
    }

    /// Configured concurrency bound.
    #[must_use]
    pub const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Slots not currently held by an outstanding call.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Synthesize a single sentence, waiting for a free slot first.
    pub async fn submit(&self, unit: SentenceUnit) -> SynthesisResult {
        let _permit = self.permits.acquire().await.map_err(|_| SynthesisFailure {
            index: unit.index,
            text: unit.text.clone(),
            error: VoiceError::Cancelled,
        })?;
        synthesize_one(self.backend.as_ref(), self.decoder.as_ref(), unit).await
    }

    /// Admit a whole turn's sentences in index order.
    ///
    /// Returns the receiving end of the result channel. The channel closes
    /// once every admitted call has reported, or early if `cancel` fires.
    /// After cancellation no further sentence is admitted, and results of
    /// calls already in flight are discarded when they arrive.
    pub fn submit_all(
        &self,
        turn: TurnId,
        sentences: Vec<SentenceUnit>,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<SynthesisResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Arc::clone(&self.backend);
        let decoder = Arc::clone(&self.decoder);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            for unit in sentences {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    acquired = Arc::clone(&permits).acquire_owned() => match acquired {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                tracing::debug!(turn = %turn, index = unit.index, "Synthesis admitted");

                let backend = Arc::clone(&backend);
                let decoder = Arc::clone(&decoder);
                let cancel = cancel.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let index = unit.index;
                    let result = synthesize_one(backend.as_ref(), decoder.as_ref(), unit).await;
                    drop(permit);

                    if cancel.is_cancelled() {
                        tracing::debug!(turn = %turn, index, "Discarding result of cancelled turn");
                        return;
                    }
                    if tx.send(result).is_err() {
                        tracing::debug!(turn = %turn, index, "Result receiver dropped");
                    }
                });
            }
        });

        rx
    }
}

impl std::fmt::Debug for SynthesisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisPool")
            .field("max_concurrent", &self.max_concurrent)
            .field("available", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// One backend call plus decode. Exactly one attempt.
async fn synthesize_one(
    backend: &dyn SynthesisBackend,
    decoder: &dyn AudioDecoder,
    unit: SentenceUnit,
) -> SynthesisResult {
    let SentenceUnit { index, text } = unit;

    let audio = match backend.synthesize(&text).await {
        Ok(bytes) => decoder.decode(&bytes),
        Err(e) => Err(VoiceError::Synthesis(e)),
    };

    match audio {
        Ok(audio) => {
            tracing::debug!(
                index,
                duration_ms = audio.duration().as_millis(),
                "Sentence synthesized"
            );
            Ok(AudioUnit { index, text, audio })
        }
        Err(error) => {
            tracing::warn!(index, error = %error, "Sentence synthesis failed, skipping");
            Err(SynthesisFailure { index, text, error })
        }
    }
}
