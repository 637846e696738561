use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Audio output error: {0}")]
    AudioOutput(String),

    #[error("Fatal error, cannot recover: {0}")]
    Fatal(String),
}
