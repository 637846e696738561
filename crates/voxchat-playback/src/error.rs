use thiserror::Error;
use voxchat_tts::TtsError;

/// Progress-event sink is unreachable (caller disconnected).
#[derive(Error, Debug)]
#[error("event delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Audio output device fault.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("clip rejected by device: {0}")]
    BadClip(String),
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("invalid playback configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("clip storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Tts(#[from] TtsError),
}
