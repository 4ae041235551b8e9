//! Shared fakes for the streaming-turn integration tests.
//!
//! Everything here runs on tokio's paused clock: latencies and playback
//! durations are virtual, so the tests are fast and deterministic.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use yui_core::{BackendError, ChatMessage, MessageRole, SynthesisBackend, TextBackend, TurnId};
use yui_voice::{
    AudioDecoder, DecodedAudio, SessionConfig, SessionController, SessionState, SilentOutput,
    SynthesisPool, VoiceError, VoiceEvent,
};

/// Length of every decoded sentence.
pub const SENTENCE_AUDIO: Duration = Duration::from_millis(100);

// ── Text backend ───────────────────────────────────────────────────

/// Replies to the latest user message from a lookup table.
pub struct ScriptedText {
    replies: HashMap<String, String>,
    latency: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedText {
    pub fn new(latency: Duration) -> Self {
        Self {
            replies: HashMap::new(),
            latency,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reply(mut self, prompt: &str, reply: &str) -> Self {
        self.replies.insert(prompt.to_string(), reply.to_string());
        self
    }
}

#[async_trait]
impl TextBackend for ScriptedText {
    async fn generate(&self, history: &[ChatMessage]) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;

        let prompt = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        self.replies
            .get(&prompt)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 404,
                body: format!("no scripted reply for {prompt:?}"),
            })
    }
}

// ── Synthesis backend ──────────────────────────────────────────────

/// Synthesis fake with per-sentence latency, scripted failures, and an
/// instrumented in-flight counter.
pub struct ScriptedSynth {
    latencies: HashMap<String, Duration>,
    default_latency: Duration,
    failing: HashSet<String>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl ScriptedSynth {
    pub fn new(default_latency: Duration) -> Self {
        Self {
            latencies: HashMap::new(),
            default_latency,
            failing: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn latency(mut self, text: &str, ms: u64) -> Self {
        self.latencies
            .insert(text.to_string(), Duration::from_millis(ms));
        self
    }

    pub fn fail(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisBackend for ScriptedSynth {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(text.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .latencies
            .get(text)
            .copied()
            .unwrap_or(self.default_latency);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(BackendError::Status {
                status: 500,
                body: "synthesis exploded".into(),
            });
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Decodes any payload into [`SENTENCE_AUDIO`] of silence.
pub struct SilenceDecoder;

impl AudioDecoder for SilenceDecoder {
    fn decode(&self, _bytes: &[u8]) -> Result<DecodedAudio, VoiceError> {
        Ok(DecodedAudio::silence(SENTENCE_AUDIO))
    }
}

// ── Session wiring ─────────────────────────────────────────────────

pub fn session(
    text: Arc<dyn TextBackend>,
    synth: Arc<ScriptedSynth>,
    max_concurrent: usize,
) -> (SessionController, UnboundedReceiver<VoiceEvent>) {
    let pool = SynthesisPool::new(synth, Arc::new(SilenceDecoder), max_concurrent).unwrap();
    SessionController::new(
        text,
        pool,
        Arc::new(SilentOutput::new()),
        SessionConfig::default(),
    )
}

// ── Event helpers ──────────────────────────────────────────────────

pub fn drain_events(rx: &mut UnboundedReceiver<VoiceEvent>) -> Vec<VoiceEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// `(turn, index)` of every sentence handed to the player.
pub fn started(events: &[VoiceEvent]) -> Vec<(TurnId, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            VoiceEvent::SentenceStarted { turn, index, .. } => Some((*turn, *index)),
            _ => None,
        })
        .collect()
}

pub fn states(events: &[VoiceEvent]) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|e| match e {
            VoiceEvent::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

/// `"Sentence 0. Sentence 1. …"` with `n` sentences.
pub fn numbered_reply(n: usize) -> String {
    (0..n)
        .map(|i| format!("Sentence {i}."))
        .collect::<Vec<_>>()
        .join(" ")
}
