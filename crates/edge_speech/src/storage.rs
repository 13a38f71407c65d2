//! Durable artifact storage with title metadata
//!
//! Copies finished audio artifacts into the configured output directory under
//! a `<voice_id>_<yyyyMMdd_HHmmss>.<ext>` name (hyphens in the voice id
//! become underscores). Provider-native mp3 files additionally get the source
//! text embedded as their ID3 title tag; tag failures are logged and never
//! fail the save.

use std::path::{Path, PathBuf};

use chrono::Local;
use id3::TagLike;
use tracing::{debug, info, instrument, warn};

use crate::error::SpeechError;
use crate::types::AudioFormat;

/// Writer for persisted artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `output_dir`, creating the directory if
    /// absent
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` when the directory cannot be
    /// created.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, SpeechError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            SpeechError::Configuration(format!(
                "Cannot create output directory {}: {e}",
                output_dir.display()
            ))
        })?;
        Ok(Self { output_dir })
    }

    /// Directory artifacts are saved into
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Copy `source` into the output directory and tag it
    ///
    /// `transcoded` marks artifacts produced by the transcoder; those keep
    /// the requested format's extension and are never tagged.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Persist` when the copy fails. Metadata problems
    /// are absorbed.
    #[instrument(skip(self, text), fields(voice = %voice_id, format = %format, transcoded))]
    pub async fn save(
        &self,
        source: &Path,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
        transcoded: bool,
    ) -> Result<PathBuf, SpeechError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let extension = if transcoded {
            format.extension()
        } else {
            AudioFormat::NATIVE.extension()
        };
        let filename = format!("{}_{timestamp}.{extension}", voice_id.replace('-', "_"));
        let destination = self.output_dir.join(filename);

        tokio::fs::copy(source, &destination)
            .await
            .map_err(|e| SpeechError::Persist(format!("Error copying temp file: {e}")))?;
        debug!(destination = %destination.display(), "Copied temp file to output directory");

        if format.is_native() && !transcoded {
            if let Err(e) = embed_title(&destination, text) {
                warn!(
                    destination = %destination.display(),
                    error = %e,
                    "Error embedding title metadata"
                );
            } else {
                debug!(destination = %destination.display(), "Embedded text as title metadata");
            }
        }

        info!(destination = %destination.display(), "Saved audio file");
        Ok(destination)
    }
}

/// Embed `text` as the ID3 title tag of an mp3 file
fn embed_title(path: &Path, text: &str) -> Result<(), SpeechError> {
    let mut tag = id3::Tag::read_from_path(path).unwrap_or_default();
    tag.set_title(text);
    tag.write_to_path(path, id3::Version::Id3v24)
        .map_err(|e| SpeechError::Metadata(e.to_string()))
}
