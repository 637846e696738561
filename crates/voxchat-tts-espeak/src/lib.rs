//! eSpeak TTS engine implementation for VoxChat
//!
//! Synthesizes one sentence at a time into a WAV file using the espeak (or
//! espeak-ng) command line. Rate-adjusted sentences go through the SSML
//! prosody document from `voxchat_tts::ssml` with espeak's markup mode.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};
use voxchat_tts::error::{TtsError, TtsResult};
use voxchat_tts::ssml;
use voxchat_tts::types::{SynthesisOptions, TtsConfig, VoiceGender, VoiceInfo};
use voxchat_tts::TtsEngine;

mod tests;

pub struct EspeakEngine {
    config: TtsConfig,
    command: Option<String>,
    available_voices: Vec<VoiceInfo>,
    is_initialized: bool,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self {
            config: TtsConfig::default(),
            command: None,
            available_voices: Vec::new(),
            is_initialized: false,
        }
    }

    /// Get the espeak command name (espeak or espeak-ng)
    async fn detect_espeak_command() -> Option<String> {
        for cmd in ["espeak", "espeak-ng"] {
            if Command::new(cmd).arg("--version").output().await.is_ok() {
                return Some(cmd.to_string());
            }
        }
        None
    }

    /// Parse espeak voice list output.
    ///
    /// Format: `Pty Language Age/Gender VoiceName File Other`, one per line
    /// after a header row.
    fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
        let voice_regex = match Regex::new(r"^\s*(\d+)\s+([\w-]+)\s+([MF\+]?)\s+([\w\-_]+)\s+") {
            Ok(re) => re,
            Err(e) => {
                warn!("Voice list regex failed to compile: {}", e);
                return Vec::new();
            }
        };

        let mut voices = Vec::new();
        for line in output.lines().skip(1) {
            if let Some(captures) = voice_regex.captures(line) {
                let language = captures.get(2).map_or("unknown", |m| m.as_str()).to_string();
                let gender_char = captures.get(3).map_or("", |m| m.as_str());
                let voice_id = captures.get(4).map_or("unknown", |m| m.as_str()).to_string();

                let gender = match gender_char {
                    "M" => Some(VoiceGender::Male),
                    "F" => Some(VoiceGender::Female),
                    _ => Some(VoiceGender::Unknown),
                };

                voices.push(VoiceInfo {
                    id: voice_id.clone(),
                    name: format!("{} ({})", language, voice_id),
                    language,
                    gender,
                });
            }
        }
        voices
    }

    /// Build the espeak argument list for synthesizing `text` to `output`.
    fn build_espeak_args(&self, text: &str, output: &Path, options: &SynthesisOptions) -> Vec<String> {
        let mut args = vec!["-w".to_string(), output.to_string_lossy().into_owned()];

        let voice = options
            .voice
            .as_deref()
            .or(self.config.default_voice.as_deref());
        if let Some(voice_id) = voice {
            args.push("-v".to_string());
            args.push(voice_id.to_string());
        }

        let rate = options.speech_rate.unwrap_or(self.config.speech_rate);
        match ssml::rate_adjusted_document(text, voice.unwrap_or("default"), rate) {
            Some(doc) => {
                // Markup mode so the prosody directive is honored
                args.push("-m".to_string());
                args.push(doc);
            }
            None => args.push(text.to_string()),
        }

        args
    }

    /// Reject output files espeak produced but left empty or truncated.
    fn validate_wav(output: &Path) -> TtsResult<()> {
        let reader = hound::WavReader::open(output)
            .map_err(|e| TtsError::SynthesisFailed(format!("unreadable WAV output: {}", e)))?;
        if reader.len() == 0 {
            return Err(TtsError::SynthesisFailed(
                "no audio samples generated".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TtsEngine for EspeakEngine {
    fn name(&self) -> &str {
        "eSpeak"
    }

    async fn is_available(&self) -> bool {
        Self::detect_espeak_command().await.is_some()
    }

    async fn initialize(&mut self, config: TtsConfig) -> TtsResult<()> {
        let cmd = Self::detect_espeak_command().await.ok_or_else(|| {
            TtsError::EngineNotAvailable(
                "eSpeak not found. Please install espeak or espeak-ng.".to_string(),
            )
        })?;

        let output = Command::new(&cmd)
            .arg("--voices")
            .output()
            .await
            .map_err(TtsError::Io)?;
        self.available_voices = Self::parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Loaded {} espeak voices", self.available_voices.len());

        self.config = config;
        self.command = Some(cmd);
        self.is_initialized = true;
        Ok(())
    }

    async fn synthesize_to_file(
        &self,
        text: &str,
        output: &Path,
        options: &SynthesisOptions,
    ) -> TtsResult<()> {
        let cmd = self.command.as_ref().ok_or(TtsError::NotInitialized)?;

        if text.trim().is_empty() {
            return Err(TtsError::SynthesisFailed("empty sentence text".to_string()));
        }

        let args = self.build_espeak_args(text, output, options);
        debug!("Running espeak synthesis: {} {:?}", cmd, args);

        let result = Command::new(cmd)
            .args(&args)
            .output()
            .await
            .map_err(TtsError::Io)?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TtsError::SynthesisFailed(format!(
                "espeak exited with {}: {}",
                result.status, stderr
            )));
        }

        Self::validate_wav(output)
    }

    async fn list_voices(&self) -> TtsResult<Vec<VoiceInfo>> {
        if !self.is_initialized {
            return Err(TtsError::NotInitialized);
        }
        Ok(self.available_voices.clone())
    }

    async fn shutdown(&mut self) -> TtsResult<()> {
        self.is_initialized = false;
        self.command = None;
        self.available_voices.clear();
        debug!("eSpeak engine shutdown");
        Ok(())
    }
}
