//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::error::{GapfillError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
///
/// Clips handed to it are short, so files are sent whole without splitting.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber using `model`.
    pub fn with_model(model: &str) -> Result<Self> {
        let client = create_client()?;

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_file(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| GapfillError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| GapfillError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim().to_string()))
                    .collect()
            })
            .unwrap_or_else(|| {
                // No segments in the response: one segment spanning the clip
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim().to_string(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());

        let source = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Transcript::new(source, segments))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.transcribe_file(audio_path, None).await
    }

    async fn transcribe_with_language(&self, audio_path: &Path, language: &str) -> Result<Transcript> {
        self.transcribe_file(audio_path, Some(language)).await
    }
}
