use thiserror::Error;

pub type TtsResult<T> = Result<T, TtsError>;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("TTS engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}
