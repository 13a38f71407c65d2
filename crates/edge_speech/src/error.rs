//! Speech pipeline errors

use thiserror::Error;

/// Errors that can occur while generating speech
///
/// Recoverable conditions (malformed voice strings, out-of-range deltas,
/// a missing alias file, a missing ffmpeg binary) are logged and degraded
/// inside the pipeline; they never surface through this enum.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Failed to connect to the synthesis provider
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Provider rejected or failed the synthesis request
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    /// ffmpeg was present but exited non-zero
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// Copying the artifact to durable storage failed
    #[error("Persist failed: {0}")]
    Persist(String),

    /// Embedding the title tag failed (absorbed by the save step, logged)
    #[error("Metadata write failed: {0}")]
    Metadata(String),

    /// Temp file deletion failed after all retries (absorbed, logged)
    #[error("Cleanup failed for {path}: {reason}")]
    Cleanup {
        /// Path that could not be deleted
        path: String,
        /// Last deletion error
        reason: String,
    },

    /// Fetching or decoding the provider voice catalog failed
    #[error("Voice catalog unavailable: {0}")]
    VoiceCatalog(String),

    /// Unknown output format name in a request
    #[error("Unsupported audio format: {0}")]
    InvalidFormat(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout during provider communication
    #[error("Speech request timeout after {0}ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(30000)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::Synthesis(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_error_message() {
        let err = SpeechError::Synthesis("voice rejected".to_string());
        assert_eq!(err.to_string(), "Synthesis failed: voice rejected");
    }

    #[test]
    fn transcode_error_message() {
        let err = SpeechError::Transcode("exit status 1".to_string());
        assert_eq!(err.to_string(), "Transcode failed: exit status 1");
    }

    #[test]
    fn persist_error_message() {
        let err = SpeechError::Persist("disk full".to_string());
        assert_eq!(err.to_string(), "Persist failed: disk full");
    }

    #[test]
    fn cleanup_error_message() {
        let err = SpeechError::Cleanup {
            path: "/tmp/a.mp3".to_string(),
            reason: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Cleanup failed for /tmp/a.mp3: busy");
    }

    #[test]
    fn invalid_format_error_message() {
        let err = SpeechError::InvalidFormat("ogg-vorbis".to_string());
        assert_eq!(err.to_string(), "Unsupported audio format: ogg-vorbis");
    }

    #[test]
    fn configuration_error_message() {
        let err = SpeechError::Configuration("empty output dir".to_string());
        assert_eq!(err.to_string(), "Configuration error: empty output dir");
    }

    #[test]
    fn timeout_error_message() {
        let err = SpeechError::Timeout(30000);
        assert_eq!(err.to_string(), "Speech request timeout after 30000ms");
    }
}
