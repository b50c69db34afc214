//! Translation port

use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;

use crate::{Error, Result};

/// Translation result with the stage's own latency
#[derive(Debug, Clone)]
pub struct Translation {
    /// Translated text
    pub text: String,

    /// Language translated from
    pub source_language: String,

    /// Language translated to
    pub target_language: String,

    /// Wall-clock seconds spent in the engine call
    pub elapsed_secs: f64,
}

/// Decoding options for the translation request
///
/// Unset fields are omitted from the request body entirely; absence is a
/// typed state, not a conditionally-built map. The default temperature is
/// low so repeated runs over the same transcript translate the same way.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOptions {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Engine-side decoding seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.2),
            seed: None,
        }
    }
}

/// Translates text between languages
///
/// Any failure is a [`Error::Translation`], fatal to the pipeline.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Translation`] if the engine fails.
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation>;
}

/// LLM-backed translator over the OpenAI chat-completions API
#[derive(Debug)]
pub struct ChatTranslator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(flatten)]
    options: &'a ChatOptions,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl ChatTranslator {
    /// Create a chat-completions translator with default options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is empty.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_options(api_key, model, ChatOptions::default())
    }

    /// Create a translator with explicit decoding options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API key is empty.
    pub fn with_options(api_key: String, model: String, options: ChatOptions) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for translation".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            options,
        })
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Translation> {
        let system = format!(
            "You are a precise translator. Translate from {source_lang} to {target_lang}. \
             Return only the translation."
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            options: &self.options,
        };

        tracing::debug!(source_lang, target_lang, chars = text.len(), "starting translation");
        let started = Instant::now();

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Translation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Translation(format!("engine error {status}: {body}")));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Translation(format!("bad response: {e}")))?;

        let translated = result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Translation("engine returned no choices".to_string()))?;

        let elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(translation = %translated, elapsed_secs, "translation complete");

        Ok(Translation {
            text: translated,
            source_language: source_lang.to_string(),
            target_language: target_lang.to_string(),
            elapsed_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_options_are_omitted_from_the_request_body() {
        let options = ChatOptions {
            temperature: None,
            seed: None,
        };
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            options: &options,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("seed").is_none());
    }

    #[test]
    fn set_options_are_flattened_into_the_request_body() {
        let options = ChatOptions {
            temperature: Some(0.2),
            seed: Some(42),
        };
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            options: &options,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["seed"], 42);
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn default_options_decode_with_low_variance_and_no_seed() {
        let options = ChatOptions::default();
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.seed, None);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = ChatTranslator::new(String::new(), "gpt-4o-mini".to_string()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
