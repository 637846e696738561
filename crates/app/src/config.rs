//! Application configuration, loaded from an optional TOML file with
//! sensible defaults for every field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxchat_foundation::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory for cached audio clips
    pub audio_dir: PathBuf,
    /// Default TTS voice
    pub voice: String,
    /// Speech rate multiplier (1.0 = native speed)
    pub speech_rate: f32,
    /// Drain loop poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Include voice and rate in the clip cache key, invalidating cached
    /// clips when the session voice changes
    pub voice_in_cache_key: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("storage/audio"),
            voice: "en".to_string(),
            speech_rate: 1.0,
            poll_interval_ms: 100,
            voice_in_cache_key: false,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)
                    .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
            }
            None => Ok(Self::default()),
        }
    }
}
