//! Foundation types for VoxChat: the shared error taxonomy and the playback
//! state machine used by the audio pipeline.

pub mod error;
pub mod state;

pub use error::AppError;
pub use state::{PlaybackState, PlaybackStateMachine};
