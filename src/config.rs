//! Configuration and credential resolution
//!
//! The single API credential and the engine model identifiers are resolved
//! once at startup (environment first, then a local `.env` key=value file)
//! and injected into the ports at construction. No component reads the
//! environment after this point.

use std::collections::HashMap;
use std::path::Path;

use crate::{Error, Result};

/// Default STT model
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Default translation model
pub const DEFAULT_TRANSLATE_MODEL: &str = "gpt-4o-mini";

/// Default TTS model
pub const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";

/// Default TTS voice identifier
pub const DEFAULT_TTS_VOICE: &str = "alloy";

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// API credential for the remote engines
    pub api_key: String,

    /// STT model identifier
    pub stt_model: String,

    /// Translation model identifier
    pub translate_model: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

impl Settings {
    /// Resolve settings from the process environment, falling back to a
    /// `.env` settings file in the current directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key can be resolved.
    pub fn resolve() -> Result<Self> {
        Self::resolve_from(Path::new(".env"))
    }

    /// Resolve settings with an explicit settings-file path
    ///
    /// Precedence per key: process environment, then the settings file,
    /// then the built-in default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key can be resolved.
    pub fn resolve_from(env_file: &Path) -> Result<Self> {
        let file = load_env_file(env_file);
        let lookup = |key: &str| std::env::var(key).ok().or_else(|| file.get(key).cloned());

        let api_key = lookup("OPENAI_API_KEY").ok_or_else(|| {
            Error::Config(format!(
                "OPENAI_API_KEY is not set (checked environment and {})",
                env_file.display()
            ))
        })?;

        Ok(Self {
            api_key,
            stt_model: lookup("VOXLATE_STT_MODEL")
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            translate_model: lookup("VOXLATE_TRANSLATE_MODEL")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_MODEL.to_string()),
            tts_model: lookup("VOXLATE_TTS_MODEL")
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            tts_voice: lookup("VOXLATE_TTS_VOICE")
                .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
        })
    }
}

/// Parse a key=value settings file
///
/// Comment lines (`#`) and lines without `=` are skipped. Values keep
/// everything after the first `=`, trimmed. A missing file yields an empty
/// map; the settings file is optional.
fn load_env_file(path: &Path) -> HashMap<String, String> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };

    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}
