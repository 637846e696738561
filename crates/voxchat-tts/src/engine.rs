//! TTS engine abstraction

use crate::error::TtsResult;
use crate::types::{SynthesisOptions, TtsConfig, VoiceInfo};
use async_trait::async_trait;
use std::path::Path;

/// Core TTS engine interface.
///
/// Implementations synthesize one sentence at a time into a WAV file on
/// durable storage. Synthesis must be callable concurrently from multiple
/// tasks once the engine is initialized.
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Engine name/identifier
    fn name(&self) -> &str;

    /// Check if the engine is available on this system
    async fn is_available(&self) -> bool;

    /// Initialize the engine with configuration
    async fn initialize(&mut self, config: TtsConfig) -> TtsResult<()>;

    /// Synthesize `text` into a WAV file at `output`.
    ///
    /// A speech rate other than 1.0 must be applied uniformly to the whole
    /// sentence via the engine's rate mechanism (see [`crate::ssml`]).
    async fn synthesize_to_file(
        &self,
        text: &str,
        output: &Path,
        options: &SynthesisOptions,
    ) -> TtsResult<()>;

    /// Get available voices
    async fn list_voices(&self) -> TtsResult<Vec<VoiceInfo>>;

    /// Shutdown the engine and cleanup resources
    async fn shutdown(&mut self) -> TtsResult<()>;
}
