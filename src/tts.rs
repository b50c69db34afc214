//! Speech synthesis with an ordered fallback chain
//!
//! Synthesis is the one stage that trades completeness for availability:
//! strategies are attempted strictly in order and the first success wins.
//! The caller observes degradation only through the outcome tier; this
//! stage never raises.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, anyhow};
use async_trait::async_trait;

/// Which fallback level produced (or failed to produce) audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisTier {
    /// Remote speech-synthesis engine
    Primary,
    /// OS-native speech utility
    LocalFallback,
    /// No engine available; translated text is the only output
    TextOnly,
}

impl SynthesisTier {
    /// Human-readable tier label for the report
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "remote engine",
            Self::LocalFallback => "local speech utility",
            Self::TextOnly => "text only (no audio)",
        }
    }
}

/// Result of the synthesis stage
///
/// `audio` is present exactly when some tier wrote a playable file.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    /// Path of the synthesized audio, if any tier produced one
    pub audio: Option<PathBuf>,

    /// Tier that settled the stage
    pub tier: SynthesisTier,

    /// Wall-clock seconds spent across all attempted tiers
    pub elapsed_secs: f64,
}

/// One ranked strategy in the fallback chain
#[async_trait]
pub trait SynthesisStrategy: Send + Sync {
    /// Tier this strategy represents
    fn tier(&self) -> SynthesisTier;

    /// Strategy name for logs
    fn name(&self) -> &'static str;

    /// Try to synthesize `text` into a playable file at `out_path`
    ///
    /// # Errors
    ///
    /// Any error moves the chain on to the next strategy; strategy errors
    /// never escape the stage.
    async fn attempt(&self, text: &str, out_path: &Path) -> anyhow::Result<()>;
}

/// Ordered fallback chain over synthesis strategies
pub struct SpeechSynthesizer {
    strategies: Vec<Box<dyn SynthesisStrategy>>,
}

impl SpeechSynthesizer {
    /// Build a chain from ranked strategies (most preferred first)
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn SynthesisStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: remote engine, then the local speech utility
    #[must_use]
    pub fn standard(api_key: String, model: String, voice: String) -> Self {
        Self::new(vec![
            Box::new(RemoteSynthesis::new(api_key, model, voice)),
            Box::new(LocalSynthesis::detect()),
        ])
    }

    /// Synthesize `text`, degrading tier by tier
    ///
    /// Infallible by construction: a strategy error is logged and the next
    /// strategy attempted; an exhausted chain yields a `TextOnly` outcome
    /// with no audio.
    pub async fn synthesize(&self, text: &str, out_path: &Path) -> SynthesisOutcome {
        let started = Instant::now();

        for strategy in &self.strategies {
            match strategy.attempt(text, out_path).await {
                Ok(()) => {
                    let elapsed_secs = started.elapsed().as_secs_f64();
                    tracing::info!(
                        strategy = strategy.name(),
                        tier = strategy.tier().label(),
                        elapsed_secs,
                        "synthesis complete"
                    );
                    return SynthesisOutcome {
                        audio: Some(out_path.to_path_buf()),
                        tier: strategy.tier(),
                        elapsed_secs,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "synthesis strategy failed, trying next"
                    );
                }
            }
        }

        SynthesisOutcome {
            audio: None,
            tier: SynthesisTier::TextOnly,
            elapsed_secs: started.elapsed().as_secs_f64(),
        }
    }
}

/// Primary tier: remote speech-synthesis API, WAV payload
pub struct RemoteSynthesis {
    client: reqwest::Client,
    api_key: String,
    model: String,
    voice: String,
}

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl RemoteSynthesis {
    /// Create the remote strategy
    #[must_use]
    pub fn new(api_key: String, model: String, voice: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            voice,
        }
    }
}

#[async_trait]
impl SynthesisStrategy for RemoteSynthesis {
    fn tier(&self) -> SynthesisTier {
        SynthesisTier::Primary
    }

    fn name(&self) -> &'static str {
        "remote"
    }

    async fn attempt(&self, text: &str, out_path: &Path) -> anyhow::Result<()> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "wav",
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("engine error {status}: {body}"));
        }

        let audio = response.bytes().await.context("payload read failed")?;

        std::fs::write(out_path, &audio)
            .with_context(|| format!("cannot write {}", out_path.display()))?;

        tracing::debug!(bytes = audio.len(), path = %out_path.display(), "speech payload saved");
        Ok(())
    }
}

/// Local fallback tier: OS speech utility writing a WAV file
///
/// The utility is invoked in its write-to-file mode so the degraded output
/// goes through the same playback stage as primary output.
pub struct LocalSynthesis {
    utility: Option<PathBuf>,
}

impl LocalSynthesis {
    /// Detect the first available speech utility on this host
    #[must_use]
    pub fn detect() -> Self {
        let utility = ["say", "espeak-ng", "espeak"]
            .iter()
            .find_map(|name| which::which(name).ok());

        if let Some(ref path) = utility {
            tracing::debug!(utility = %path.display(), "local speech utility found");
        }

        Self { utility }
    }

    /// Use an explicit utility path (tests)
    #[must_use]
    pub fn with_utility(path: PathBuf) -> Self {
        Self {
            utility: Some(path),
        }
    }
}

#[async_trait]
impl SynthesisStrategy for LocalSynthesis {
    fn tier(&self) -> SynthesisTier {
        SynthesisTier::LocalFallback
    }

    fn name(&self) -> &'static str {
        "local"
    }

    async fn attempt(&self, text: &str, out_path: &Path) -> anyhow::Result<()> {
        let Some(utility) = &self.utility else {
            return Err(anyhow!("no local speech utility on this host"));
        };

        let mut command = tokio::process::Command::new(utility);
        if utility.file_stem().is_some_and(|n| n == "say") {
            // macOS say: write 16-bit little-endian PCM at the pipeline rate
            command
                .arg("-o")
                .arg(out_path)
                .arg("--data-format=LEI16@16000")
                .arg(text);
        } else {
            // espeak / espeak-ng
            command.arg("-w").arg(out_path).arg(text);
        }

        let status = command
            .status()
            .await
            .context("failed to run speech utility")?;

        if !status.success() {
            return Err(anyhow!("speech utility exited with {status}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStrategy {
        tier: SynthesisTier,
        succeed: bool,
    }

    #[async_trait]
    impl SynthesisStrategy for FixedStrategy {
        fn tier(&self) -> SynthesisTier {
            self.tier
        }

        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn attempt(&self, _text: &str, out_path: &Path) -> anyhow::Result<()> {
            if self.succeed {
                std::fs::write(out_path, b"RIFF").unwrap();
                Ok(())
            } else {
                Err(anyhow!("unavailable"))
            }
        }
    }

    fn chain(primary_ok: bool, local_ok: bool) -> SpeechSynthesizer {
        SpeechSynthesizer::new(vec![
            Box::new(FixedStrategy {
                tier: SynthesisTier::Primary,
                succeed: primary_ok,
            }),
            Box::new(FixedStrategy {
                tier: SynthesisTier::LocalFallback,
                succeed: local_ok,
            }),
        ])
    }

    #[tokio::test]
    async fn first_success_wins_with_its_tier() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let outcome = chain(true, true).synthesize("hello", &out).await;
        assert_eq!(outcome.tier, SynthesisTier::Primary);
        assert_eq!(outcome.audio.as_deref(), Some(out.as_path()));
    }

    #[tokio::test]
    async fn primary_failure_degrades_to_local_with_audio() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let outcome = chain(false, true).synthesize("hello", &out).await;
        assert_eq!(outcome.tier, SynthesisTier::LocalFallback);
        assert!(outcome.audio.is_some());
        assert!(out.exists());
    }

    #[tokio::test]
    async fn exhausted_chain_is_text_only_without_audio() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let outcome = chain(false, false).synthesize("hello", &out).await;
        assert_eq!(outcome.tier, SynthesisTier::TextOnly);
        assert!(outcome.audio.is_none());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn empty_chain_is_text_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let outcome = SpeechSynthesizer::new(Vec::new())
            .synthesize("hello", &out)
            .await;
        assert_eq!(outcome.tier, SynthesisTier::TextOnly);
        assert!(outcome.audio.is_none());
    }

    #[tokio::test]
    async fn broken_local_utility_fails_the_strategy() {
        let strategy = LocalSynthesis::with_utility(PathBuf::from("/nonexistent/say"));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        assert!(strategy.attempt("hello", &out).await.is_err());
    }

    #[tokio::test]
    async fn missing_local_utility_fails_the_strategy_not_the_stage() {
        let strategy = LocalSynthesis { utility: None };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        assert!(strategy.attempt("hello", &out).await.is_err());

        // ...but inside a chain it only degrades the outcome.
        let outcome = SpeechSynthesizer::new(vec![Box::new(strategy)])
            .synthesize("hello", &out)
            .await;
        assert_eq!(outcome.tier, SynthesisTier::TextOnly);
    }
}
