//! Edge Speech - Text-to-Speech generation pipeline
//!
//! Wraps an external speech synthesis provider behind a single blocking
//! entry point: parse a compact voice spec string, synthesize a temp mp3,
//! optionally transcode it with ffmpeg, optionally persist it with the
//! source text as title metadata, and reap transient files in the
//! background.
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` defines the [`SpeechSynthesizer`] trait (port)
//! - `providers` contains concrete implementations (adapters)
//! - `pipeline` orchestrates one request end to end
//!
//! # Voice spec strings
//!
//! `<lang>-<REGION>-<VoiceName>[<±n>R][<±n>P][+s]`, e.g.
//! `en-US-AnaNeural+10r-5p+s`: rate +10%, pitch -5Hz, persist the output.
//! Friendly aliases from a JSON mapping file resolve to canonical strings
//! before parsing.
//!
//! # Example
//!
//! ```ignore
//! use edge_speech::{SpeechConfig, SpeechPipeline};
//!
//! let config = SpeechConfig::load()?;
//! let pipeline = SpeechPipeline::new(config)?;
//!
//! let path = pipeline
//!     .generate_speech("Hello", "en-US-AnaNeural+10r", "mp3", None)
//!     .await?;
//! ```

pub mod aliases;
pub mod cleanup;
pub mod config;
pub mod converter;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod providers;
pub mod storage;
pub mod types;
pub mod voice;

pub use aliases::VoiceAliasTable;
pub use cleanup::{Reaper, TempRegistry};
pub use config::SpeechConfig;
pub use converter::AudioTranscoder;
pub use error::SpeechError;
pub use pipeline::SpeechPipeline;
pub use ports::SpeechSynthesizer;
pub use providers::EdgeTtsProvider;
pub use storage::ArtifactStore;
pub use types::{AudioFormat, ModelInfo, SynthesisRequest, VoiceGender, VoiceInfo, VoiceSpec};
pub use voice::{parse_voice_spec, speed_to_rate_percent};
