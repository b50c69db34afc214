//! Speech-to-text port

use std::time::Instant;

use async_trait::async_trait;

use crate::{Error, Result};

/// Transcription result with the stage's own latency
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Recognized text
    pub text: String,

    /// Language the audio was declared to be in
    pub source_language: String,

    /// Wall-clock seconds spent in the engine call
    pub elapsed_secs: f64,
}

/// Transcribes speech to text
///
/// The language hint is advisory; engines may ignore it. Any failure is a
/// [`Error::Transcription`], which is fatal to the pipeline.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`] if the engine fails or the audio
    /// is empty.
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<Transcript>;
}

/// OpenAI Whisper transcription over HTTP
#[derive(Debug)]
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

impl WhisperTranscriber {
    /// Create a Whisper transcriber
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is empty.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> Result<Transcript> {
        if audio.is_empty() {
            return Err(Error::Transcription("audio is empty".to_string()));
        }

        tracing::debug!(audio_bytes = audio.len(), "starting transcription");
        let started = Instant::now();

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        if !language_hint.is_empty() {
            form = form.text("language", language_hint.to_string());
        }

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "engine error {status}: {body}"
            )));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Transcription(format!("bad response: {e}")))?;

        let elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(transcript = %result.text, elapsed_secs, "transcription complete");

        Ok(Transcript {
            text: result.text.trim().to_string(),
            source_language: language_hint.to_string(),
            elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let err = WhisperTranscriber::new(String::new(), "whisper-1".to_string()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn empty_audio_is_a_transcription_error() {
        let t = WhisperTranscriber::new("sk-test".to_string(), "whisper-1".to_string()).unwrap();
        let err = t.transcribe(&[], "en").await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
        assert_eq!(err.exit_code(), 3);
    }
}
