//! Pipeline orchestration
//!
//! Drives capture → transcription → translation → synthesis → playback in
//! strict order, stamping elapsed time per stage. Capture, transcription,
//! and translation failures abort the run; synthesis degrades through its
//! fallback chain; playback is fire-and-forget and only logged.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::audio::{CapturePolicy, CapturePort};
use crate::playback::Player;
use crate::stt::{Transcriber, Transcript};
use crate::translate::{Translation, Translator};
use crate::tts::{SpeechSynthesizer, SynthesisOutcome};
use crate::{Error, Result};

/// Where the input audio comes from
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// Record from the input device under the given termination policy
    Record(CapturePolicy),

    /// Use an existing recording; capture is skipped entirely and the
    /// file's bytes go to transcription untouched
    File(PathBuf),
}

/// One pipeline invocation
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Input source
    pub input: AudioInput,

    /// Language spoken in the input (advisory hint to the engine)
    pub source_lang: String,

    /// Language to translate into
    pub target_lang: String,

    /// Where recorded audio is written
    pub input_wav: PathBuf,

    /// Where synthesized audio is written
    pub output_wav: PathBuf,

    /// Whether to play the synthesized audio back
    pub playback: bool,
}

/// Final report of a successful run
///
/// Built incrementally as stages complete; immutable once returned.
/// `total_secs` is the exact sum of the four stage timings.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Seconds spent capturing (zero when an existing file was supplied)
    pub capture_secs: f64,

    /// Transcription stage result
    pub transcript: Transcript,

    /// Translation stage result
    pub translation: Translation,

    /// Synthesis stage outcome, including the fallback tier
    pub synthesis: SynthesisOutcome,

    /// Sum of capture, transcription, translation, and synthesis times
    pub total_secs: f64,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== TRANSCRIPT ({}) ===", self.transcript.source_language)?;
        writeln!(f, "{}", self.transcript.text)?;
        writeln!(f)?;
        writeln!(
            f,
            "=== TRANSLATION ({} -> {}) ===",
            self.translation.source_language, self.translation.target_language
        )?;
        writeln!(f, "{}", self.translation.text)?;
        writeln!(f)?;
        writeln!(f, "=== SPOKEN OUTPUT ===")?;
        match &self.synthesis.audio {
            Some(path) => writeln!(
                f,
                "{} ({})",
                self.synthesis.tier.label(),
                path.display()
            )?,
            None => writeln!(f, "{}", self.synthesis.tier.label())?,
        }
        writeln!(f)?;
        writeln!(f, "=== DELAYS (s) ===")?;
        writeln!(f, "Capture:    {:.2}", self.capture_secs)?;
        writeln!(f, "Transcribe: {:.2}", self.transcript.elapsed_secs)?;
        writeln!(f, "Translate:  {:.2}", self.translation.elapsed_secs)?;
        writeln!(f, "Synthesize: {:.2}", self.synthesis.elapsed_secs)?;
        write!(f, "Total:      {:.2}", self.total_secs)
    }
}

/// Sequences the pipeline stages over injected ports
///
/// All engine clients and the resolved credential are supplied at
/// construction; no component performs ambient lookups.
pub struct Interpreter {
    capture: Arc<dyn CapturePort>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    synthesizer: SpeechSynthesizer,
    player: Arc<dyn Player>,
}

impl Interpreter {
    /// Assemble a pipeline from its ports
    #[must_use]
    pub fn new(
        capture: Arc<dyn CapturePort>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: SpeechSynthesizer,
        player: Arc<dyn Player>,
    ) -> Self {
        Self {
            capture,
            transcriber,
            translator,
            synthesizer,
            player,
        }
    }

    /// Run the pipeline once
    ///
    /// # Errors
    ///
    /// Returns the first fatal stage error: [`Error::Capture`],
    /// [`Error::Transcription`], or [`Error::Translation`]. Synthesis and
    /// playback never fail the run.
    pub async fn run(&self, request: &RunRequest) -> Result<PipelineReport> {
        // 1. Capture (or bypass with an existing file)
        let (audio_bytes, capture_secs) = match &request.input {
            AudioInput::File(path) => {
                tracing::info!(path = %path.display(), "using existing recording");
                let bytes = std::fs::read(path).map_err(|e| {
                    Error::Capture(format!("cannot read input file {}: {e}", path.display()))
                })?;
                (bytes, 0.0)
            }
            AudioInput::Record(policy) => {
                let started = Instant::now();
                let buffer = self.capture.record(*policy, &request.input_wav).await?;
                let capture_secs = started.elapsed().as_secs_f64();
                let bytes = crate::audio::wav::encode(&buffer)?;
                (bytes, capture_secs)
            }
        };

        // 2. Transcription (fatal)
        let transcript = self
            .transcriber
            .transcribe(&audio_bytes, &request.source_lang)
            .await?;

        // 3. Translation (fatal)
        let translation = self
            .translator
            .translate(&transcript.text, &request.source_lang, &request.target_lang)
            .await?;

        // 4. Synthesis (degrades, never fatal)
        let synthesis = self
            .synthesizer
            .synthesize(&translation.text, &request.output_wav)
            .await;

        // 5. Playback (best-effort, fire-and-forget)
        if request.playback {
            match &synthesis.audio {
                Some(audio) => {
                    if !self.player.play(audio) {
                        tracing::warn!(
                            path = %audio.display(),
                            "playback unavailable; audio file kept on disk"
                        );
                    }
                }
                None => tracing::debug!("no audio to play back"),
            }
        }

        let total_secs = capture_secs
            + transcript.elapsed_secs
            + translation.elapsed_secs
            + synthesis.elapsed_secs;

        Ok(PipelineReport {
            capture_secs,
            transcript,
            translation,
            synthesis,
            total_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::SynthesisTier;

    fn report(capture: f64, stt: f64, translate: f64, tts: f64) -> PipelineReport {
        PipelineReport {
            capture_secs: capture,
            transcript: Transcript {
                text: "bonjour".to_string(),
                source_language: "fr".to_string(),
                elapsed_secs: stt,
            },
            translation: Translation {
                text: "hello".to_string(),
                source_language: "fr".to_string(),
                target_language: "en".to_string(),
                elapsed_secs: translate,
            },
            synthesis: SynthesisOutcome {
                audio: None,
                tier: SynthesisTier::TextOnly,
                elapsed_secs: tts,
            },
            total_secs: capture + stt + translate + tts,
        }
    }

    #[test]
    fn total_is_the_exact_sum_of_stage_timings() {
        let r = report(0.25, 1.5, 0.75, 2.0);
        assert!((r.total_secs - 4.5).abs() < f64::EPSILON);

        // Arbitrary timings, not just round ones.
        let r = report(0.013, 2.71, 0.333, 1.414);
        assert!(
            (r.total_secs
                - (r.capture_secs
                    + r.transcript.elapsed_secs
                    + r.translation.elapsed_secs
                    + r.synthesis.elapsed_secs))
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn display_includes_every_stage() {
        let text = report(0.1, 0.2, 0.3, 0.4).to_string();
        assert!(text.contains("TRANSCRIPT (fr)"));
        assert!(text.contains("bonjour"));
        assert!(text.contains("TRANSLATION (fr -> en)"));
        assert!(text.contains("hello"));
        assert!(text.contains("text only (no audio)"));
        assert!(text.contains("Total:      1.00"));
    }

    #[test]
    fn display_shows_audio_path_when_present() {
        let mut r = report(0.0, 0.0, 0.0, 0.0);
        r.synthesis.audio = Some(PathBuf::from("outputs/output_translated.wav"));
        r.synthesis.tier = SynthesisTier::Primary;

        let text = r.to_string();
        assert!(text.contains("remote engine (outputs/output_translated.wav)"));
    }
}
