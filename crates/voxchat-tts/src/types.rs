//! Core types for text-to-speech functionality

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// TTS synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Default voice to use when a request does not name one
    pub default_voice: Option<String>,
    /// Speech rate multiplier (1.0 is the voice's native speed)
    pub speech_rate: f32,
    /// Engine-specific options
    pub engine_options: HashMap<String, String>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            default_voice: None,
            speech_rate: 1.0,
            engine_options: HashMap::new(),
        }
    }
}

/// Per-request synthesis options
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Voice to use, overriding the engine default
    pub voice: Option<String>,
    /// Speech rate multiplier, overriding the engine default
    pub speech_rate: Option<f32>,
}

/// Voice information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Unique voice identifier
    pub id: String,
    /// Human-readable voice name
    pub name: String,
    /// Language code (e.g., "en-US")
    pub language: String,
    /// Gender (if the engine reports one)
    pub gender: Option<VoiceGender>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum VoiceGender {
    Male,
    Female,
    Neutral,
    Unknown,
}
