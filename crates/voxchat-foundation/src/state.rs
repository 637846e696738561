use crate::error::AppError;
use parking_lot::RwLock;
use std::sync::Arc;

/// State of the single playback session. Owned by the playback engine and
/// mutated only through its public operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopping,
}

pub struct PlaybackStateMachine {
    state: Arc<RwLock<PlaybackState>>,
}

impl Default for PlaybackStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackStateMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(PlaybackState::Idle)),
        }
    }

    pub fn transition(&self, new_state: PlaybackState) -> Result<(), AppError> {
        use PlaybackState::*;
        let mut current = self.state.write();

        let valid = matches!(
            (*current, new_state),
            (Idle, Playing)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, Stopping)
                | (Paused, Stopping)
                | (Stopping, Idle)
                | (Playing, Idle)
                | (Paused, Idle)
        );

        if !valid {
            return Err(AppError::Fatal(format!(
                "Invalid playback state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::debug!("Playback state: {:?} -> {:?}", *current, new_state);
        *current = new_state;
        Ok(())
    }

    pub fn current(&self) -> PlaybackState {
        *self.state.read()
    }
}
