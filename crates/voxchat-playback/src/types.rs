//! Core types shared across the playback pipeline

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

pub type SessionId = u64;
pub type MessageId = u64;

/// Smallest addressable unit of a chat message for TTS purposes.
///
/// Ids are stable within a message and ordered ascending in any slice the
/// caller supplies, but are not necessarily dense or 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub id: u32,
    pub text: String,
}

impl Sentence {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A synthesized clip waiting for playback. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyClip {
    pub sentence_id: u32,
    pub path: PathBuf,
}

static EPOCH_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Token identifying one generation/playback run.
///
/// Strictly monotone per process; a queue only accepts clips tagged with its
/// current epoch, so a superseded worker's output is silently discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next() -> Self {
        Epoch(EPOCH_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epochs_are_strictly_increasing() {
        let a = Epoch::next();
        let b = Epoch::next();
        assert!(b.value() > a.value());
    }
}
