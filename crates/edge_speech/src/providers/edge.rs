//! Edge TTS provider
//!
//! Talks to an edge-tts-compatible HTTP endpoint: a synthesis route that
//! accepts text plus voice/rate/pitch strings and returns mp3 bytes, and a
//! `voices/list` route serving the catalog in the readaloud shape
//! (`ShortName`/`Gender`/`Locale`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::ports::SpeechSynthesizer;
use crate::types::{AudioFormat, VoiceGender, VoiceInfo};

const MODEL_NAME: &str = "edge-tts";

/// HTTP adapter for the edge synthesis service
#[derive(Debug, Clone)]
pub struct EdgeTtsProvider {
    client: Client,
    base_url: String,
}

impl EdgeTtsProvider {
    /// Create a new provider from the pipeline configuration
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/synthesize", self.base_url)
    }

    fn voices_url(&self) -> String {
        format!("{}/voices/list", self.base_url)
    }
}

/// Synthesis request body
#[derive(Debug, Serialize)]
struct SynthesizeBody<'a> {
    input: &'a str,
    voice: &'a str,
    rate: &'a str,
    pitch: &'a str,
    output_format: &'a str,
}

/// Catalog entry as served by the provider
#[derive(Debug, Deserialize)]
struct CatalogVoice {
    #[serde(rename = "ShortName")]
    short_name: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Locale")]
    locale: String,
}

impl From<CatalogVoice> for VoiceInfo {
    fn from(v: CatalogVoice) -> Self {
        let gender = match v.gender.as_str() {
            "Male" => VoiceGender::Male,
            "Female" => VoiceGender::Female,
            _ => VoiceGender::Neutral,
        };
        Self {
            name: v.short_name,
            gender,
            language: v.locale,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), voice = %voice, rate = %rate, pitch = %pitch))]
    async fn synthesize_to_file(
        &self,
        text: &str,
        voice: &str,
        rate: &str,
        pitch: &str,
        output: &Path,
    ) -> Result<(), SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::Synthesis(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let body = SynthesizeBody {
            input: text,
            voice,
            rate,
            pitch,
            output_format: "mp3",
        };

        let response = self
            .client
            .post(self.synthesize_url())
            .header(reqwest::header::ACCEPT, AudioFormat::NATIVE.mime_type())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Synthesis(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to read audio: {e}")))?;

        if audio.is_empty() {
            return Err(SpeechError::Synthesis(
                "Provider returned empty audio".to_string(),
            ));
        }

        tokio::fs::write(output, &audio)
            .await
            .map_err(|e| SpeechError::Synthesis(format!("Failed to write audio file: {e}")))?;

        debug!(audio_size = audio.len(), output = %output.display(), "Synthesis complete");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let response = self
            .client
            .get(self.voices_url())
            .send()
            .await
            .map_err(|e| SpeechError::VoiceCatalog(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::VoiceCatalog(format!("HTTP {status}")));
        }

        let catalog: Vec<CatalogVoice> = response
            .json()
            .await
            .map_err(|e| SpeechError::VoiceCatalog(format!("Failed to parse catalog: {e}")))?;

        debug!(voices = catalog.len(), "Fetched voice catalog");
        Ok(catalog.into_iter().map(VoiceInfo::from).collect())
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.voices_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Edge TTS availability check failed: {}", e);
                false
            },
        }
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_provider(mock_server: &MockServer) -> EdgeTtsProvider {
        let config = SpeechConfig {
            provider_base_url: mock_server.uri(),
            ..Default::default()
        };
        EdgeTtsProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn synthesize_writes_audio_bytes() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mp3".to_vec()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let file = tempfile::NamedTempFile::with_suffix(".mp3").unwrap();

        provider
            .synthesize_to_file("Hello", "en-US-AnaNeural", "+10%", "+10Hz", file.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), b"ID3fake-mp3");
    }

    #[tokio::test]
    async fn synthesize_sends_rate_and_pitch() {
        let mock_server = MockServer::start().await;

        let expected = serde_json::json!({
            "input": "Hello",
            "voice": "en-US-AnaNeural",
            "rate": "+10%",
            "pitch": "+10Hz",
            "output_format": "mp3",
        });

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .and(header("accept", "audio/mpeg"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let file = tempfile::NamedTempFile::with_suffix(".mp3").unwrap();

        provider
            .synthesize_to_file("Hello", "en-US-AnaNeural", "+10%", "+10Hz", file.path())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn synthesize_rejects_empty_text() {
        let mock_server = MockServer::start().await;
        let provider = create_test_provider(&mock_server);
        let file = tempfile::NamedTempFile::new().unwrap();

        let result = provider
            .synthesize_to_file("", "en-US-AnaNeural", "+0%", "+0Hz", file.path())
            .await;

        assert!(matches!(result, Err(SpeechError::Synthesis(_))));
    }

    #[tokio::test]
    async fn synthesize_propagates_provider_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad voice"))
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let file = tempfile::NamedTempFile::new().unwrap();

        let result = provider
            .synthesize_to_file("Hello", "xx-XX-Nobody", "+0%", "+0Hz", file.path())
            .await;

        match result {
            Err(SpeechError::Synthesis(msg)) => assert!(msg.contains("bad voice")),
            other => panic!("expected synthesis error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn synthesize_rejects_empty_audio() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::new()))
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let file = tempfile::NamedTempFile::new().unwrap();

        let result = provider
            .synthesize_to_file("Hello", "en-US-AnaNeural", "+0%", "+0Hz", file.path())
            .await;

        assert!(matches!(result, Err(SpeechError::Synthesis(_))));
    }

    #[tokio::test]
    async fn list_voices_maps_catalog_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/voices/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "ShortName": "en-US-AnaNeural",
                    "Gender": "Female",
                    "Locale": "en-US",
                    "FriendlyName": "Microsoft Ana Online"
                },
                {
                    "ShortName": "de-DE-ConradNeural",
                    "Gender": "Male",
                    "Locale": "de-DE",
                    "FriendlyName": "Microsoft Conrad Online"
                }
            ])))
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let voices = provider.list_voices().await.unwrap();

        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].name, "en-US-AnaNeural");
        assert_eq!(voices[0].gender, VoiceGender::Female);
        assert_eq!(voices[0].language, "en-US");
        assert_eq!(voices[1].gender, VoiceGender::Male);
    }

    #[tokio::test]
    async fn list_voices_fails_on_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/voices/list"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        let result = provider.list_voices().await;

        assert!(matches!(result, Err(SpeechError::VoiceCatalog(_))));
    }

    #[tokio::test]
    async fn is_available_follows_catalog_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/voices/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let provider = create_test_provider(&mock_server);
        assert!(provider.is_available().await);
    }

    #[test]
    fn model_name_is_stable() {
        let config = SpeechConfig::default();
        let provider = EdgeTtsProvider::new(&config).unwrap();
        assert_eq!(provider.model_name(), "edge-tts");
    }
}
