//! Best-effort audio playback on the host
//!
//! Playback is fire-and-forget: the player process is spawned detached and
//! never awaited. A missing player or a failed spawn is reported as
//! `false`, never as an error; the audio file stays on disk for manual use
//! either way.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Plays an audio file on the host
pub trait Player: Send + Sync {
    /// Start playing the file; `false` if no player is available or the
    /// spawn failed
    fn play(&self, path: &Path) -> bool;
}

/// Platform-native playback via whichever player binary is present
pub struct HostPlayer {
    command: Option<PlayerCommand>,
}

#[derive(Debug, Clone)]
struct PlayerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl HostPlayer {
    /// Detect a playback mechanism for this host
    #[must_use]
    pub fn detect() -> Self {
        Self {
            command: detect_player(),
        }
    }
}

impl Player for HostPlayer {
    fn play(&self, path: &Path) -> bool {
        let Some(player) = &self.command else {
            tracing::warn!("no audio player available on this host");
            return false;
        };

        let spawned = Command::new(&player.program)
            .args(&player.args)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(_) => {
                tracing::debug!(
                    player = %player.program.display(),
                    path = %path.display(),
                    "playback started"
                );
                true
            }
            Err(e) => {
                tracing::warn!(player = %player.program.display(), error = %e, "playback failed");
                false
            }
        }
    }
}

#[cfg(target_os = "macos")]
fn detect_player() -> Option<PlayerCommand> {
    which::which("afplay").ok().map(|program| PlayerCommand {
        program,
        args: Vec::new(),
    })
}

#[cfg(target_os = "windows")]
fn detect_player() -> Option<PlayerCommand> {
    which::which("powershell").ok().map(|program| PlayerCommand {
        program,
        args: vec![
            "-c".to_string(),
            "(New-Object System.Media.SoundPlayer $args[0]).PlaySync()".to_string(),
        ],
    })
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn detect_player() -> Option<PlayerCommand> {
    ["aplay", "paplay"].iter().find_map(|name| {
        which::which(name).ok().map(|program| PlayerCommand {
            program,
            args: Vec::new(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_player_returns_false_not_error() {
        let player = HostPlayer { command: None };
        assert!(!player.play(Path::new("out.wav")));
    }

    #[test]
    fn broken_player_binary_returns_false() {
        let player = HostPlayer {
            command: Some(PlayerCommand {
                program: PathBuf::from("/nonexistent/player"),
                args: Vec::new(),
            }),
        };
        assert!(!player.play(Path::new("out.wav")));
    }

    #[test]
    fn working_command_spawns_detached() {
        // `true` exits immediately; play() must not block on it.
        let Ok(program) = which::which("true") else {
            return;
        };
        let player = HostPlayer {
            command: Some(PlayerCommand {
                program,
                args: Vec::new(),
            }),
        };
        assert!(player.play(Path::new("out.wav")));
    }
}
