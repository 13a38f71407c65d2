//! Types for the speech pipeline
//!
//! Audio formats, parsed voice specs, synthesis requests and the provider
//! catalog entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;
use crate::voice::speed_to_rate_percent;

/// Audio formats a request may ask for
///
/// The provider always emits mp3; every other format is reached through the
/// transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3, the provider-native container
    Mp3,
    /// AAC audio in an mp4 container
    Aac,
    /// WAV (uncompressed PCM)
    Wav,
    /// Opus audio in an ogg container
    Opus,
    /// FLAC (lossless)
    Flac,
}

impl AudioFormat {
    /// Format the synthesis provider emits directly
    pub const NATIVE: Self = Self::Mp3;

    /// File extension used for artifacts in this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Wav => "wav",
            Self::Opus => "opus",
            Self::Flac => "flac",
        }
    }

    /// MIME type for this format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Aac => "audio/aac",
            Self::Wav => "audio/wav",
            Self::Opus => "audio/opus",
            Self::Flac => "audio/flac",
        }
    }

    /// Whether this is the provider-native format
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Mp3)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "aac" => Ok(Self::Aac),
            "wav" => Ok(Self::Wav),
            "opus" => Ok(Self::Opus),
            "flac" => Ok(Self::Flac),
            other => Err(SpeechError::InvalidFormat(other.to_string())),
        }
    }
}

/// Parsed voice specification
///
/// Derived once per request from the raw voice string (after alias
/// resolution) and immutable afterwards. Deltas are kept as signed integers
/// in `-99..=99`; out-of-range values are discarded during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSpec {
    /// Base voice identifier, e.g. `en-US-AnaNeural`
    pub base_voice: String,
    /// Rate adjustment in percent relative to neutral speech
    pub rate_delta: Option<i8>,
    /// Pitch adjustment in Hz relative to neutral speech
    pub pitch_delta: Option<i8>,
    /// Whether the result should be persisted to the output directory
    pub save_output: bool,
}

impl VoiceSpec {
    /// Rate string handed to the provider
    ///
    /// An explicit rate delta from the voice string always wins; otherwise
    /// the request's speed multiplier is converted to a percentage.
    #[must_use]
    pub fn rate_str(&self, speed: f32) -> String {
        self.rate_delta
            .map_or_else(|| speed_to_rate_percent(speed), |d| format!("{d:+}%"))
    }

    /// Pitch string handed to the provider; neutral when no delta was given
    #[must_use]
    pub fn pitch_str(&self) -> String {
        self.pitch_delta
            .map_or_else(|| "+0Hz".to_string(), |d| format!("{d:+}Hz"))
    }
}

/// A single speech generation request
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to synthesize
    pub text: String,
    /// Parsed voice specification
    pub voice: VoiceSpec,
    /// Requested output format
    pub output_format: AudioFormat,
    /// Multiplicative speed (1.0 = neutral), used when no rate delta is set
    pub speed: f32,
}

/// Entry in the provider's voice catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Short voice name, e.g. `en-US-AnaNeural`
    pub name: String,
    /// Voice gender as reported by the provider
    pub gender: VoiceGender,
    /// Locale of the voice, e.g. `en-US`
    pub language: String,
}

/// Voice gender classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceGender {
    /// Male voice
    Male,
    /// Female voice
    Female,
    /// Neutral or unreported
    Neutral,
}

/// Static model catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
}
