//! Main CLI parser and top-level argument handling.
//!
//! Every backend option can also come from the environment (or a `.env`
//! file), so a configured shell only needs `yui talk`.

use clap::{Args, Parser};
use yui_core::Settings;

use crate::commands::Commands;

/// Streaming speech for assistant replies.
#[derive(Parser, Debug)]
#[command(name = "yui")]
#[command(about = "Talk to an assistant that answers out loud, sentence by sentence")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Do not open an audio device; playback takes the audio's duration in silence
    #[arg(long, global = true)]
    pub mute: bool,

    /// Maximum speech synthesis requests in flight at once
    #[arg(long, env = "YUI_MAX_CONCURRENT", global = true)]
    pub max_concurrent: Option<usize>,

    /// Speak replies verbatim instead of stripping markdown first
    #[arg(long, global = true)]
    pub keep_markdown: bool,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings for the chat and speech endpoints.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Base URL of the OpenAI-compatible chat endpoint
    #[arg(long, env = "YUI_CHAT_URL", global = true)]
    pub chat_url: Option<String>,

    /// Chat model name
    #[arg(long, env = "YUI_CHAT_MODEL", global = true)]
    pub chat_model: Option<String>,

    /// Bearer token for the chat endpoint
    #[arg(long, env = "YUI_CHAT_API_KEY", global = true, hide_env_values = true)]
    pub chat_api_key: Option<String>,

    /// Replace the built-in system prompt
    #[arg(long, global = true)]
    pub system_prompt: Option<String>,

    /// Base URL of the OpenAI-compatible speech endpoint
    #[arg(long, env = "YUI_SPEECH_URL", global = true)]
    pub speech_url: Option<String>,

    /// Speech model name
    #[arg(long, env = "YUI_SPEECH_MODEL", global = true)]
    pub speech_model: Option<String>,

    /// Voice used for synthesis
    #[arg(long, env = "YUI_SPEECH_VOICE", global = true)]
    pub voice: Option<String>,

    /// Bearer token for the speech endpoint
    #[arg(long, env = "YUI_SPEECH_API_KEY", global = true, hide_env_values = true)]
    pub speech_api_key: Option<String>,
}

impl Cli {
    /// Defaults overlaid with whatever was given on the command line.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(k) = self.max_concurrent {
            settings.max_concurrent_synthesis = k;
        }
        settings.strip_markdown = !self.keep_markdown;
        self.backend.apply(&mut settings);
        settings
    }
}

impl BackendArgs {
    fn apply(&self, settings: &mut Settings) {
        let chat = &mut settings.chat;
        overlay(&mut chat.base_url, self.chat_url.as_deref());
        overlay(&mut chat.model, self.chat_model.as_deref());
        overlay(&mut chat.system_prompt, self.system_prompt.as_deref());
        if self.chat_api_key.is_some() {
            chat.api_key.clone_from(&self.chat_api_key);
        }

        let speech = &mut settings.speech;
        overlay(&mut speech.base_url, self.speech_url.as_deref());
        overlay(&mut speech.model, self.speech_model.as_deref());
        overlay(&mut speech.voice, self.voice.as_deref());
        if self.speech_api_key.is_some() {
            speech.api_key.clone_from(&self.speech_api_key);
        }
    }
}

fn overlay(target: &mut String, value: Option<&str>) {
    if let Some(value) = value {
        value.clone_into(target);
    }
}
