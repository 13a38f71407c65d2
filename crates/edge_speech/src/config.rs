//! Configuration for the speech pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for speech generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the synthesis provider
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Default locale for voice listing, e.g. `en-US`
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Default speed multiplier when a request carries none
    #[serde(default = "default_speed")]
    pub default_speed: f32,

    /// Directory saved artifacts are copied into (created if absent)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Path to the JSON voice alias file
    #[serde(default = "default_voice_aliases_path")]
    pub voice_aliases_path: PathBuf,

    /// Provider request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay before each temp file deletion attempt, in seconds
    #[serde(default = "default_cleanup_delay_secs")]
    pub cleanup_delay_secs: u64,

    /// Deletion attempts per temp file before giving up
    #[serde(default = "default_cleanup_retries")]
    pub cleanup_retries: u32,

    /// Upper bound on concurrently running cleanup tasks
    #[serde(default = "default_max_concurrent_cleanups")]
    pub max_concurrent_cleanups: usize,

    /// ffmpeg binary path (defaults to `ffmpeg` in PATH)
    #[serde(default)]
    pub ffmpeg_path: Option<String>,

    /// Journal file mirroring the tracked temp set across restarts
    ///
    /// Without a journal the startup sweep has nothing to sweep.
    #[serde(default)]
    pub registry_journal: Option<PathBuf>,
}

fn default_provider_base_url() -> String {
    "https://speech.platform.example.net/tts/v1".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

const fn default_speed() -> f32 {
    1.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tts_output")
}

fn default_voice_aliases_path() -> PathBuf {
    PathBuf::from("voice_mappings.json")
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

const fn default_cleanup_delay_secs() -> u64 {
    30
}

const fn default_cleanup_retries() -> u32 {
    3
}

const fn default_max_concurrent_cleanups() -> usize {
    4
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider_base_url: default_provider_base_url(),
            default_language: default_language(),
            default_speed: default_speed(),
            output_dir: default_output_dir(),
            voice_aliases_path: default_voice_aliases_path(),
            timeout_ms: default_timeout_ms(),
            cleanup_delay_secs: default_cleanup_delay_secs(),
            cleanup_retries: default_cleanup_retries(),
            max_concurrent_cleanups: default_max_concurrent_cleanups(),
            ffmpeg_path: None,
            registry_journal: None,
        }
    }
}

impl SpeechConfig {
    /// Load configuration from an optional `config.*` file plus
    /// `EDGE_SPEECH_*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("EDGE_SPEECH")
                    .separator("__")
                    .try_parsing(true),
            );

        let loaded: Self = builder.build()?.try_deserialize()?;
        Ok(loaded)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.provider_base_url.is_empty() {
            return Err("Provider base URL must not be empty".to_string());
        }

        if self.default_speed <= 0.0 {
            return Err(format!(
                "Default speed must be positive, got {}",
                self.default_speed
            ));
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }

        if self.cleanup_retries == 0 {
            return Err("Cleanup retries must be greater than 0".to_string());
        }

        if self.max_concurrent_cleanups == 0 {
            return Err("Max concurrent cleanups must be greater than 0".to_string());
        }

        Ok(())
    }
}
