//! Decoding synthesized bytes into playable PCM.

use std::io::Cursor;
use std::time::Duration;

use rodio::Source;

use crate::error::VoiceError;

/// Decoded, interleaved PCM audio ready for an [`AudioOutput`](crate::player::AudioOutput).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved f32 samples.
    pub samples: Vec<f32>,

    /// Number of interleaved channels.
    pub channels: u16,

    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Silence of the given length (mono, 24 kHz).
    #[must_use]
    pub fn silence(duration: Duration) -> Self {
        const RATE: u32 = 24_000;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frames = (duration.as_secs_f64() * f64::from(RATE)).round() as usize;
        Self {
            samples: vec![0.0; frames],
            channels: 1,
            sample_rate: RATE,
        }
    }

    /// Playback length of the buffer.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / usize::from(self.channels);
        #[allow(clippy::cast_precision_loss)]
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Whether there is anything to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Converts raw synthesis output into [`DecodedAudio`].
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, VoiceError>;
}

/// WAV decoder backed by rodio.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, VoiceError> {
        if bytes.is_empty() {
            return Err(VoiceError::Decode("empty audio payload".to_string()));
        }

        let decoder = rodio::Decoder::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| VoiceError::Decode(e.to_string()))?;

        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();

        tracing::trace!(
            channels,
            sample_rate,
            samples = samples.len(),
            "Decoded synthesized audio"
        );

        Ok(DecodedAudio {
            samples,
            channels,
            sample_rate,
        })
    }
}
