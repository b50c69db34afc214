//! Error types for the voice interpreter

use thiserror::Error;

/// Result type alias for voxlate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a pipeline run
///
/// Synthesis degradation and playback unavailability are deliberately not
/// represented here: the synthesis stage reports a tier instead of failing,
/// and playback failures are logged and ignored.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, bad settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio capture error (no device, stream failure, unreadable input file)
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech-to-text error
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Translation error
    #[error("translation error: {0}")]
    Translation(String),

    /// IO error at the process boundary (output directory creation)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error
    ///
    /// Capture and configuration failures share a code: both mean the run
    /// ended before any engine was reached.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Capture(_) => 2,
            Self::Transcription(_) => 3,
            Self::Translation(_) => 4,
            Self::Io(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_fatal_stage() {
        assert_eq!(Error::Capture("no device".into()).exit_code(), 2);
        assert_eq!(Error::Transcription("engine down".into()).exit_code(), 3);
        assert_eq!(Error::Translation("engine down".into()).exit_code(), 4);
    }

    #[test]
    fn config_errors_share_the_pre_stage_code() {
        assert_eq!(Error::Config("OPENAI_API_KEY missing".into()).exit_code(), 2);
    }
}
