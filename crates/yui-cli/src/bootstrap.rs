//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together:
//! - chat and speech HTTP adapters (via yui-voice)
//! - the synthesis pool and WAV decoder
//! - the speaker (or a silent stand-in with `--mute`)
//!
//! Command handlers receive the composed session and only drive turns.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;
use yui_core::{Settings, validate_settings};
use yui_voice::{
    AudioOutput, HttpSpeechBackend, OpenAiChatBackend, RodioOutput, SessionConfig,
    SessionController, SilentOutput, SynthesisPool, VoiceEvent, WavDecoder,
};

use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
    /// Skip the audio device entirely.
    pub mute: bool,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            settings: cli.settings(),
            mute: cli.mute,
        }
    }
}

/// Fully composed session plus the event stream for the terminal.
pub struct CliContext {
    pub session: SessionController,
    pub events: UnboundedReceiver<VoiceEvent>,
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build backends, audio output, and the session.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let CliConfig { settings, mute } = config;
    validate_settings(&settings).context("invalid configuration")?;

    let chat = OpenAiChatBackend::new(settings.chat.clone())
        .context("failed to create chat client")?;
    let speech = HttpSpeechBackend::new(settings.speech.clone())
        .context("failed to create speech client")?;

    let pool = SynthesisPool::new(
        Arc::new(speech),
        Arc::new(WavDecoder),
        settings.max_concurrent_synthesis,
    )?;

    let output: Arc<dyn AudioOutput> = if mute {
        Arc::new(SilentOutput::new())
    } else {
        Arc::new(
            RodioOutput::spawn()
                .context("failed to open the audio output (use --mute to run without sound)")?,
        )
    };

    tracing::debug!(
        chat_url = %settings.chat.base_url,
        speech_url = %settings.speech.base_url,
        max_concurrent = settings.max_concurrent_synthesis,
        mute,
        "Session configured"
    );

    let (session, events) = SessionController::new(
        Arc::new(chat),
        pool,
        output,
        SessionConfig::from(&settings),
    );

    Ok(CliContext { session, events })
}
