//! Runtime wiring: builds the single playback engine, the TTS engine, and
//! the orchestrator, and owns their lifecycle.

use crate::config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use voxchat_foundation::AppError;
use voxchat_playback::{
    ClipCache, EngineConfig, PlaybackEngine, PlaybackOrchestrator, RodioDevice,
};
use voxchat_tts::types::TtsConfig;
use voxchat_tts::TtsEngine;
use voxchat_tts_espeak::EspeakEngine;

/// Handle to the running pipeline. There is exactly one playback engine per
/// process; anything that wants the audio device goes through this handle's
/// orchestrator.
pub struct Runtime {
    orchestrator: Arc<PlaybackOrchestrator>,
    engine: Arc<PlaybackEngine>,
}

impl Runtime {
    pub async fn init(config: &AppConfig) -> Result<Self, AppError> {
        let mut tts = EspeakEngine::new();
        tts.initialize(TtsConfig {
            default_voice: Some(config.voice.clone()),
            speech_rate: config.speech_rate,
            ..TtsConfig::default()
        })
        .await
        .map_err(|e| AppError::Config(format!("TTS engine unavailable: {}", e)))?;
        let tts: Arc<dyn TtsEngine> = Arc::new(tts);

        let device =
            Arc::new(RodioDevice::open().map_err(|e| AppError::AudioOutput(e.to_string()))?);
        let engine = Arc::new(PlaybackEngine::new(
            device,
            EngineConfig {
                poll_interval: Duration::from_millis(config.poll_interval_ms),
            },
        ));
        let cache = Arc::new(ClipCache::new(&config.audio_dir, config.voice_in_cache_key));

        let orchestrator = Arc::new(PlaybackOrchestrator::new(engine.clone(), tts, cache));
        info!("VoxChat runtime initialized");
        Ok(Self {
            orchestrator,
            engine,
        })
    }

    pub fn orchestrator(&self) -> Arc<PlaybackOrchestrator> {
        self.orchestrator.clone()
    }

    /// Stop playback and release the audio device.
    pub fn shutdown(self) {
        info!("Shutting down VoxChat runtime...");
        self.engine.stop();
    }
}
