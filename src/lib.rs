//! Voxlate - voice interpreter CLI
//!
//! Records (or loads) speech, transcribes it, translates the transcript,
//! synthesizes speech in the target language, and plays it back, timing
//! each stage along the way.
//!
//! # Architecture
//!
//! ```text
//! capture ──▶ transcription ──▶ translation ──▶ synthesis ──▶ playback
//!  (fatal)       (fatal)          (fatal)      (degrades)   (best-effort)
//! ```
//!
//! The external engines sit behind ports ([`stt::Transcriber`],
//! [`translate::Translator`], [`tts::SynthesisStrategy`],
//! [`playback::Player`]) injected into the [`Interpreter`] at
//! construction, together with the resolved credential.

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod stt;
pub mod translate;
pub mod tts;

pub use config::Settings;
pub use error::{Error, Result};
pub use pipeline::{AudioInput, Interpreter, PipelineReport, RunRequest};
