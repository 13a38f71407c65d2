//! Audio format transcoder
//!
//! Converts the provider-native mp3 artifact to the requested output format
//! by invoking ffmpeg. ffmpeg availability is probed when a conversion is
//! actually needed; an absent binary degrades conversion to a no-op rather
//! than failing the request.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::SpeechError;
use crate::types::AudioFormat;

/// Constant bitrate applied to all lossy target formats
const LOSSY_BITRATE: &str = "192k";

/// ffmpeg-backed transcoder
#[derive(Debug, Clone, Default)]
pub struct AudioTranscoder {
    /// ffmpeg binary path (defaults to "ffmpeg" in PATH)
    ffmpeg_path: Option<String>,
}

impl AudioTranscoder {
    /// Create a transcoder using `ffmpeg` from PATH
    #[must_use]
    pub const fn new() -> Self {
        Self { ffmpeg_path: None }
    }

    /// Create a transcoder with a custom ffmpeg path
    #[must_use]
    pub fn with_ffmpeg_path(path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: Some(path.into()),
        }
    }

    fn ffmpeg_path(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or("ffmpeg")
    }

    /// Check if ffmpeg is installed and runnable
    #[instrument(skip(self))]
    pub async fn is_available(&self) -> bool {
        Command::new(self.ffmpeg_path())
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    /// Convert `input` into `output` encoded as `target`
    ///
    /// The caller decides whether conversion is needed at all; this method
    /// always invokes ffmpeg exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Transcode` when ffmpeg cannot be spawned or
    /// exits non-zero. A failed conversion is not retried.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        target: AudioFormat,
    ) -> Result<(), SpeechError> {
        let mut cmd = Command::new(self.ffmpeg_path());
        cmd.arg("-i")
            .arg(input)
            .args(["-c:a", Self::codec(target)]);

        // wav is uncompressed PCM, a bitrate flag makes no sense there
        if target != AudioFormat::Wav {
            cmd.args(["-b:a", LOSSY_BITRATE]);
        }

        cmd.args(["-f", Self::container(target)])
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(input = %input.display(), output = %output.display(), "Running ffmpeg");

        let result = cmd
            .output()
            .await
            .map_err(|e| SpeechError::Transcode(format!("Failed to run ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(SpeechError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        debug!("Conversion to {target} successful");
        Ok(())
    }

    /// ffmpeg codec for a target format
    const fn codec(format: AudioFormat) -> &'static str {
        match format {
            AudioFormat::Aac => "aac",
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Opus => "libopus",
            AudioFormat::Flac => "flac",
        }
    }

    /// ffmpeg container (`-f`) for a target format
    const fn container(format: AudioFormat) -> &'static str {
        match format {
            AudioFormat::Aac => "mp4",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "ogg",
            AudioFormat::Flac => "flac",
        }
    }
}
