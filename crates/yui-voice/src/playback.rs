//! Speaker output via `rodio`, confined to a dedicated OS thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. Rather than reaching for
//! `unsafe impl Send`, the stream lives on one thread for its whole life and
//! [`RodioOutput`] forwards commands to it over a channel. Each played buffer
//! gets its own sink and a watcher thread that fires the completion signal
//! when the sink drains or is stopped.

use std::sync::{Arc, mpsc};
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;

use crate::decode::DecodedAudio;
use crate::error::VoiceError;
use crate::player::{AudioOutput, PlaybackDone};

// ── Commands ───────────────────────────────────────────────────────

enum OutputCommand {
    /// Replace the current sink with one playing `audio`.
    Play {
        audio: DecodedAudio,
        done: oneshot::Sender<()>,
        reply: mpsc::Sender<Result<(), VoiceError>>,
    },

    /// Stop the current sink (fire-and-forget).
    Stop,

    /// Release the device and exit the thread.
    Shutdown,
}

// ── Device state (audio thread only) ───────────────────────────────

struct SpeakerSink {
    /// Must stay alive for the handle to produce sound.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    current: Option<Arc<Sink>>,
}

impl SpeakerSink {
    fn open() -> Result<Self, VoiceError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;

        tracing::info!("Audio output initialized on default device");

        Ok(Self {
            _stream: stream,
            handle,
            current: None,
        })
    }

    fn play(&mut self, audio: DecodedAudio, done: oneshot::Sender<()>) -> Result<(), VoiceError> {
        self.stop();

        let sink = Arc::new(
            Sink::try_new(&self.handle)
                .map_err(|e| VoiceError::OutputStreamError(e.to_string()))?,
        );
        sink.append(SamplesBuffer::new(
            audio.channels,
            audio.sample_rate,
            audio.samples,
        ));

        // `sleep_until_end` returns when the queue drains or `stop` empties it.
        let watched = Arc::clone(&sink);
        thread::Builder::new()
            .name("yui-audio-watch".into())
            .spawn(move || {
                watched.sleep_until_end();
                let _ = done.send(());
            })
            .map_err(|e| VoiceError::OutputStreamError(format!("failed to spawn watcher: {e}")))?;

        self.current = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.current.take() {
            sink.stop();
            tracing::trace!("Speaker sink stopped");
        }
    }
}

// ── Handle ─────────────────────────────────────────────────────────

/// [`AudioOutput`] on the default speaker.
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Device errors are reported back through an init channel, so a missing
    /// device fails here rather than on the first sentence.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<OutputCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("yui-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn run(
        cmd_rx: &mpsc::Receiver<OutputCommand>,
        init_tx: &mpsc::Sender<Result<(), VoiceError>>,
    ) {
        let mut speaker = match SpeakerSink::open() {
            Ok(speaker) => speaker,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };
        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                OutputCommand::Play { audio, done, reply } => {
                    let _ = reply.send(speaker.play(audio, done));
                }
                OutputCommand::Stop => speaker.stop(),
                OutputCommand::Shutdown => break,
            }
        }

        speaker.stop();
        tracing::debug!("Audio thread shutting down");
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, audio: DecodedAudio) -> Result<PlaybackDone, VoiceError> {
        let (done_tx, done_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(OutputCommand::Play {
                audio,
                done: done_tx,
                reply: reply_tx,
            })
            .map_err(|_| VoiceError::AudioThreadDied)?;
        reply_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;
        Ok(done_rx)
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(OutputCommand::Stop);
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput")
            .field("running", &self.thread.is_some())
            .finish()
    }
}
