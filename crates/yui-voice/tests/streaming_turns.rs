//! Integration tests for `SessionController` turns.
//!
//! Each test drives full turns (reply → segment → synthesis pool → ordered
//! queue → player) against scripted backends and a silent output. No audio
//! hardware or network access is required.
//!
//! # What is tested
//!
//! - Sentences play in index order regardless of synthesis latency
//! - Empty replies complete without any synthesis
//! - A failed sentence is skipped without stalling later ones
//! - The synthesis concurrency bound, within and across turns
//! - A new turn silences the previous one
//! - Reply failures, explicit cancel, direct speech, and history bookkeeping

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::time::Instant;
use tokio_test::assert_ok;
use yui_core::{BackendError, ChatMessage, MessageRole, TextBackend};
use yui_voice::{SessionState, TurnOutcome, VoiceEvent};

use common::{
    ScriptedSynth, ScriptedText, SENTENCE_AUDIO, drain_events, numbered_reply, session, started,
    states,
};

mock! {
    Text {}

    #[async_trait]
    impl TextBackend for Text {
        async fn generate(&self, history: &[ChatMessage]) -> Result<String, BackendError>;
    }
}

// ── Ordering ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn sentences_play_in_order_despite_out_of_order_synthesis() {
    let reply = "Hello there. How are you? I am fine!";
    let text = Arc::new(ScriptedText::new(Duration::ZERO).reply("hi", reply));
    let synth = Arc::new(
        ScriptedSynth::new(Duration::from_millis(10))
            .latency("Hello there.", 300)
            .latency("How are you?", 50)
            .latency("I am fine!", 150),
    );
    let (session, mut rx) = session(text, synth.clone(), 3);
    let start = Instant::now();

    let report = assert_ok!(session.submit("hi").await);

    assert_eq!(report.outcome, TurnOutcome::Completed);
    assert_eq!(report.played, vec![0, 1, 2]);
    assert!(report.skipped.is_empty());

    // Nothing can start before sentence 0 arrives; the rest are already buffered.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300) + SENTENCE_AUDIO * 3);
    assert!(elapsed < Duration::from_millis(700));

    let events = drain_events(&mut rx);
    let order: Vec<usize> = started(&events).into_iter().map(|(_, i)| i).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert!(events.contains(&VoiceEvent::TurnCompleted {
        turn: report.turn,
        played: 3,
        skipped: 0,
    }));
    assert_eq!(synth.calls(), 3);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn empty_reply_completes_without_synthesis() {
    let text = Arc::new(ScriptedText::new(Duration::from_millis(5)).reply("hi", ""));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, mut rx) = session(text, synth.clone(), 3);

    let report = assert_ok!(session.submit("hi").await);

    assert_eq!(report.outcome, TurnOutcome::Completed);
    assert!(report.played.is_empty());
    assert_eq!(synth.calls(), 0);

    let events = drain_events(&mut rx);
    assert!(started(&events).is_empty());
    assert_eq!(
        states(&events),
        vec![
            SessionState::AwaitingReply,
            SessionState::Streaming,
            SessionState::Idle
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_sentence_is_skipped_without_stalling() {
    let reply = "First one. Second one. Third one.";
    let text = Arc::new(ScriptedText::new(Duration::ZERO).reply("go", reply));
    let synth = Arc::new(
        ScriptedSynth::new(Duration::from_millis(20))
            .latency("Second one.", 400)
            .fail("Second one."),
    );
    let (session, mut rx) = session(text, synth, 3);

    let report = assert_ok!(session.submit("go").await);

    assert_eq!(report.outcome, TurnOutcome::Completed);
    assert_eq!(report.played, vec![0, 2]);
    assert_eq!(report.skipped, vec![1]);

    let events = drain_events(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        VoiceEvent::SentenceSkipped { index: 1, reason, .. } if reason.contains("500")
    )));
    assert!(events.contains(&VoiceEvent::TurnCompleted {
        turn: report.turn,
        played: 2,
        skipped: 1,
    }));
}

// ── Concurrency bound ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn never_more_than_k_synthesis_calls_outstanding() {
    let text = Arc::new(ScriptedText::new(Duration::ZERO).reply("long", &numbered_reply(10)));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(250)));
    let (session, _rx) = session(text, synth.clone(), 3);

    let report = assert_ok!(session.submit("long").await);

    assert_eq!(report.played, (0..10).collect::<Vec<_>>());
    assert_eq!(synth.max_in_flight(), 3);
    assert_eq!(synth.calls(), 10);
}

#[tokio::test(start_paused = true)]
async fn admission_follows_sentence_order() {
    let text = Arc::new(ScriptedText::new(Duration::ZERO).reply("long", &numbered_reply(6)));
    let synth = Arc::new(
        ScriptedSynth::new(Duration::from_millis(30))
            .latency("Sentence 0.", 200)
            .latency("Sentence 2.", 5),
    );
    let (session, _rx) = session(text, synth.clone(), 2);

    assert_ok!(session.submit("long").await);

    let requested = synth.requested.lock().unwrap().clone();
    let expected: Vec<String> = (0..6).map(|i| format!("Sentence {i}.")).collect();
    assert_eq!(requested, expected);
}

#[tokio::test(start_paused = true)]
async fn concurrency_bound_spans_superseded_turns() {
    let text = Arc::new(
        ScriptedText::new(Duration::ZERO)
            .reply("first", &numbered_reply(3))
            .reply("second", "One. Two. Three."),
    );
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(1_000)));
    let (session, _rx) = session(text, synth.clone(), 3);

    let first = session.submit("first");
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = session.submit("second");

    let first = assert_ok!(first.await);
    let second = assert_ok!(second.await);

    assert_eq!(first.outcome, TurnOutcome::Cancelled);
    assert_eq!(second.outcome, TurnOutcome::Completed);
    assert_eq!(second.played, vec![0, 1, 2]);
    assert!(synth.max_in_flight() <= 3);
}

// ── Cancellation ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn new_turn_silences_previous_turn() {
    let text = Arc::new(
        ScriptedText::new(Duration::from_millis(20))
            .reply("first", &numbered_reply(6))
            .reply("second", "Okay. Stopping now."),
    );
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(50)));
    let (session, mut rx) = session(text, synth, 3);

    let first = session.submit("first");
    tokio::time::sleep(Duration::from_millis(250)).await;

    let before = drain_events(&mut rx);
    assert!(!started(&before).is_empty(), "first turn should be speaking");
    assert_eq!(session.state(), SessionState::Streaming);

    let second = session.submit("second");
    assert_eq!(session.state(), SessionState::AwaitingReply);

    let first = assert_ok!(first.await);
    let second = assert_ok!(second.await);

    assert_eq!(first.outcome, TurnOutcome::Cancelled);
    assert!(first.played.len() < 6);
    assert_eq!(second.outcome, TurnOutcome::Completed);
    assert_eq!(second.played, vec![0, 1]);

    let after = drain_events(&mut rx);
    assert!(
        started(&after).iter().all(|(turn, _)| *turn == second.turn),
        "audio from the superseded turn reached the player: {after:?}"
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn superseded_reply_is_not_recorded() {
    let text = Arc::new(
        ScriptedText::new(Duration::from_millis(1_000))
            .reply("first", "Too late.")
            .reply("second", "Just in time."),
    );
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, _rx) = session(text, synth, 3);

    let first = session.submit("first");
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = session.submit("second");

    assert_eq!(assert_ok!(first.await).outcome, TurnOutcome::Cancelled);
    assert_eq!(assert_ok!(second.await).outcome, TurnOutcome::Completed);

    assert_eq!(
        session.history(),
        vec![
            ChatMessage::user("first"),
            ChatMessage::user("second"),
            ChatMessage::assistant("Just in time."),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_playback_and_goes_idle() {
    let text = Arc::new(ScriptedText::new(Duration::ZERO));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, mut rx) = session(text, synth, 3);

    let turn = session.speak(numbered_reply(5));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(session.status().now_speaking.is_some());

    session.cancel();
    let report = assert_ok!(turn.await);

    assert_eq!(report.outcome, TurnOutcome::Cancelled);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.status().now_speaking, None);

    let events = drain_events(&mut rx);
    assert_eq!(states(&events).last(), Some(&SessionState::Idle));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, VoiceEvent::TurnCompleted { .. })),
        "a cancelled turn must not report completion"
    );
}

// ── Reply generation ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn reply_failure_fails_turn_without_speaking() {
    let mut text = MockText::new();
    text.expect_generate()
        .withf(|history| history.len() == 1 && history[0].content == "hello?")
        .times(1)
        .returning(|_| Err(BackendError::Transport("connection refused".into())));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, mut rx) = session(Arc::new(text), synth.clone(), 3);

    let report = assert_ok!(session.submit("hello?").await);

    let TurnOutcome::Failed(message) = &report.outcome else {
        panic!("expected failure, got {:?}", report.outcome);
    };
    assert!(message.contains("connection refused"));
    assert_eq!(synth.calls(), 0);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.history(), vec![ChatMessage::user("hello?")]);

    let events = drain_events(&mut rx);
    assert!(events.iter().any(|e| matches!(e, VoiceEvent::Error { .. })));
    assert_eq!(
        states(&events),
        vec![SessionState::AwaitingReply, SessionState::Idle]
    );
}

#[tokio::test(start_paused = true)]
async fn busy_while_awaiting_reply() {
    let text = Arc::new(ScriptedText::new(Duration::from_millis(500)).reply("hi", "Hey."));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, _rx) = session(text, synth, 3);

    let turn = session.submit("hi");
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.state(), SessionState::AwaitingReply);
    assert!(session.status().is_busy);

    assert_ok!(turn.await);
    assert!(!session.status().is_busy);
}

#[tokio::test(start_paused = true)]
async fn history_accumulates_across_turns() {
    let mut text = MockText::new();
    text.expect_generate()
        .times(2)
        .returning(|history| Ok(format!("Heard {} messages.", history.len())));
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, _rx) = session(Arc::new(text), synth, 3);

    assert_ok!(session.submit("one").await);
    assert_ok!(session.submit("two").await);

    let history = session.history();
    let roles: Vec<MessageRole> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );
    assert_eq!(history[3].content, "Heard 3 messages.");

    session.clear_history();
    assert!(session.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn speak_skips_reply_generation() {
    let mut text = MockText::new();
    text.expect_generate().never();
    let synth = Arc::new(ScriptedSynth::new(Duration::from_millis(10)));
    let (session, mut rx) = session(Arc::new(text), synth, 3);

    let report = assert_ok!(session.speak("**Hi** there. Bye!").await);

    assert_eq!(report.played, vec![0, 1]);
    assert!(session.history().is_empty());

    let events = drain_events(&mut rx);
    assert_eq!(
        states(&events),
        vec![SessionState::Streaming, SessionState::Idle]
    );
    let captions: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            VoiceEvent::SentenceStarted { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(captions, vec!["Hi there.", "Bye!"]);
}
