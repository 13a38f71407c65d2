//! Speech generation pipeline
//!
//! Orchestrates one request end to end: parse the voice spec, synthesize a
//! provider-native temp artifact, transcode when a different format was
//! requested, optionally persist the result, and hand every transient file to
//! the reaper. The caller blocks until an output path (or failure) is
//! produced; persistence and deletion run as detached tasks, so the returned
//! temp path is only guaranteed to exist for the reaper's delay window.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::aliases::VoiceAliasTable;
use crate::cleanup::{Reaper, TempRegistry};
use crate::config::SpeechConfig;
use crate::converter::AudioTranscoder;
use crate::error::SpeechError;
use crate::ports::SpeechSynthesizer;
use crate::providers::EdgeTtsProvider;
use crate::storage::ArtifactStore;
use crate::types::{AudioFormat, ModelInfo, SynthesisRequest, VoiceInfo};
use crate::voice::parse_voice_spec;

/// Top-level speech generation service
pub struct SpeechPipeline {
    config: SpeechConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcoder: AudioTranscoder,
    store: ArtifactStore,
    registry: TempRegistry,
    reaper: Arc<Reaper>,
    aliases: VoiceAliasTable,
}

impl std::fmt::Debug for SpeechPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechPipeline")
            .field("model", &self.synthesizer.model_name())
            .field("output_dir", &self.store.output_dir())
            .finish_non_exhaustive()
    }
}

impl SpeechPipeline {
    /// Create a pipeline backed by the edge synthesis provider
    ///
    /// Loads the voice alias table, prepares the output directory, recovers
    /// and sweeps the temp registry, and starts the reaper worker.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` when the configuration is
    /// invalid or the output directory cannot be created.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        let provider = EdgeTtsProvider::new(&config)?;
        Self::with_synthesizer(config, Arc::new(provider))
    }

    /// Create a pipeline with a custom synthesis backend
    ///
    /// # Errors
    ///
    /// Same conditions as [`SpeechPipeline::new`].
    pub fn with_synthesizer(
        config: SpeechConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let aliases = VoiceAliasTable::load(&config.voice_aliases_path);

        let registry = config
            .registry_journal
            .as_ref()
            .map_or_else(TempRegistry::in_memory, TempRegistry::with_journal);
        // Collect whatever a previous run left behind
        registry.sweep();

        let reaper = Arc::new(Reaper::spawn(
            registry.clone(),
            Duration::from_secs(config.cleanup_delay_secs),
            config.cleanup_retries,
            config.max_concurrent_cleanups,
        ));

        let transcoder = config
            .ffmpeg_path
            .as_ref()
            .map_or_else(AudioTranscoder::new, AudioTranscoder::with_ffmpeg_path);

        let store = ArtifactStore::new(&config.output_dir)?;

        Ok(Self {
            config,
            synthesizer,
            transcoder,
            store,
            registry,
            reaper,
            aliases,
        })
    }

    /// Generate speech for `text` and return the path of the audio artifact
    ///
    /// `voice` is a raw voice spec string (alias, base voice, modifiers,
    /// optional `+s`). `output_format` names one of the supported formats.
    /// `speed` falls back to the configured default when `None`; an explicit
    /// rate modifier in the voice string always takes precedence over it.
    ///
    /// The returned path is a tracked temp file; it will be deleted by the
    /// reaper after the configured delay, so callers must consume it
    /// promptly. With the `+s` suffix a durable copy is additionally written
    /// to the output directory by a detached task.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::InvalidFormat`, `Synthesis`, or `Transcode`.
    /// Persistence and cleanup problems are logged, never surfaced here.
    #[instrument(skip(self, text), fields(text_len = text.len(), voice = %voice, format = %output_format))]
    pub async fn generate_speech(
        &self,
        text: &str,
        voice: &str,
        output_format: &str,
        speed: Option<f32>,
    ) -> Result<PathBuf, SpeechError> {
        let request = SynthesisRequest {
            text: text.to_string(),
            voice: parse_voice_spec(voice, &self.aliases),
            output_format: output_format.parse()?,
            speed: speed.unwrap_or(self.config.default_speed),
        };
        self.run(request).await
    }

    /// Execute one synthesis request
    async fn run(&self, request: SynthesisRequest) -> Result<PathBuf, SpeechError> {
        let spec = &request.voice;
        let format = request.output_format;
        let rate = spec.rate_str(request.speed);
        let pitch = spec.pitch_str();

        info!(
            base_voice = %spec.base_voice,
            rate = %rate,
            pitch = %pitch,
            save = spec.save_output,
            "Generating audio"
        );

        let native = self.create_temp(AudioFormat::NATIVE)?;
        if let Err(e) = self
            .synthesizer
            .synthesize_to_file(&request.text, &spec.base_voice, &rate, &pitch, &native)
            .await
        {
            // No partial artifact: untrack and drop whatever was written
            self.registry.remove(&native);
            let _ = tokio::fs::remove_file(&native).await;
            return Err(e);
        }

        let (artifact, transcoded) = self.transcode_if_needed(native, format).await?;

        if spec.save_output {
            self.spawn_persist(
                artifact.clone(),
                &request.text,
                spec.base_voice.clone(),
                format,
                transcoded,
            );
        } else {
            self.reaper.schedule(&artifact);
        }

        Ok(artifact)
    }

    /// Transcode the native artifact when a different format was requested
    ///
    /// Returns the resulting artifact path and whether the transcoder
    /// produced it. A missing ffmpeg degrades to returning the native
    /// artifact untouched.
    async fn transcode_if_needed(
        &self,
        native: PathBuf,
        format: AudioFormat,
    ) -> Result<(PathBuf, bool), SpeechError> {
        if format.is_native() {
            return Ok((native, false));
        }

        if !self.transcoder.is_available().await {
            warn!("ffmpeg is not available, returning unmodified mp3 artifact");
            return Ok((native, false));
        }

        let converted = self.create_temp(format)?;
        match self.transcoder.convert(&native, &converted, format).await {
            Ok(()) => {
                // The intermediate native file is no longer needed
                self.reaper.schedule(&native);
                Ok((converted, true))
            },
            Err(e) => {
                self.registry.remove(&converted);
                let _ = tokio::fs::remove_file(&converted).await;
                self.reaper.schedule(&native);
                Err(e)
            },
        }
    }

    /// Persist the artifact in a detached task and schedule its cleanup
    ///
    /// Runs fire-and-forget: the request returns without awaiting the copy.
    /// The source artifact is handed to the reaper regardless of the save
    /// outcome.
    fn spawn_persist(
        &self,
        source: PathBuf,
        text: &str,
        voice_id: String,
        format: AudioFormat,
        transcoded: bool,
    ) {
        let store = self.store.clone();
        let reaper = Arc::clone(&self.reaper);
        let text = text.to_string();

        tokio::spawn(async move {
            if let Err(e) = store
                .save(&source, &text, &voice_id, format, transcoded)
                .await
            {
                error!(error = %e, "Error saving audio file");
            }
            reaper.schedule(source);
        });
    }

    /// Create a tracked temp file for an artifact in `format`
    fn create_temp(&self, format: AudioFormat) -> Result<PathBuf, SpeechError> {
        let file = tempfile::Builder::new()
            .prefix("edge_speech_")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()
            .map_err(|e| SpeechError::Synthesis(format!("Failed to create temp file: {e}")))?;

        let (_, path) = file
            .keep()
            .map_err(|e| SpeechError::Synthesis(format!("Failed to keep temp file: {e}")))?;

        self.registry.add(&path);
        Ok(path)
    }

    /// Static model catalog
    #[must_use]
    pub fn list_models() -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "tts-1".to_string(),
                name: "Text-to-speech v1".to_string(),
            },
            ModelInfo {
                id: "tts-1-hd".to_string(),
                name: "Text-to-speech v1 HD".to_string(),
            },
        ]
    }

    /// List provider voices, filtered by locale
    ///
    /// `None` filters by the configured default locale; `"all"` disables
    /// filtering.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::VoiceCatalog` when the provider catalog cannot
    /// be fetched.
    pub async fn list_voices(
        &self,
        language: Option<&str>,
    ) -> Result<Vec<VoiceInfo>, SpeechError> {
        let voices = self.synthesizer.list_voices().await?;

        let filter = language.unwrap_or(&self.config.default_language);
        if filter == "all" {
            return Ok(voices);
        }

        Ok(voices
            .into_iter()
            .filter(|v| v.language == filter)
            .collect())
    }

    /// Paths currently tracked as transient
    #[must_use]
    pub fn tracked_temp_files(&self) -> Vec<PathBuf> {
        self.registry.tracked()
    }

    /// Drain pending deletions and stop the reaper
    pub async fn shutdown(&self) {
        self.reaper.shutdown().await;
    }
}
