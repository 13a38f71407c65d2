//! Port definitions for speech synthesis
//!
//! The pipeline talks to the external provider only through this trait, so
//! tests can substitute an in-process fake.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::types::VoiceInfo;

/// Port for speech synthesis backends
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into a provider-native mp3 file at `output`
    ///
    /// `rate` and `pitch` are provider-format strings such as `"+10%"` and
    /// `"+0Hz"`.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Synthesis` (or a transport variant) when the
    /// provider call fails for any reason; no partial file is left behind at
    /// `output` in that case.
    async fn synthesize_to_file(
        &self,
        text: &str,
        voice: &str,
        rate: &str,
        pitch: &str,
        output: &Path,
    ) -> Result<(), SpeechError>;

    /// Fetch the provider's voice catalog
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::VoiceCatalog` when the catalog cannot be
    /// fetched or decoded.
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Check whether the provider is reachable
    async fn is_available(&self) -> bool;

    /// Name of the synthesis backend
    fn model_name(&self) -> &str;
}
