//! Epoch-guarded clip queue shared by the generation worker (producer) and
//! the playback engine (consumer).
//!
//! Clips are appended and popped strictly in sentence order; the queue never
//! reorders. Every append and pop carries the epoch of the run that issued
//! it, and operations whose epoch does not match the queue's current epoch
//! are rejected — a superseded worker can keep running but can no longer
//! write into a queue that a newer run is draining.

use crate::types::{Epoch, ReadyClip};
use parking_lot::Mutex;
use std::collections::VecDeque;

pub struct ClipQueue {
    inner: Mutex<Inner>,
}

struct Inner {
    epoch: Epoch,
    clips: VecDeque<ReadyClip>,
}

impl ClipQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch: Epoch::next(),
                clips: VecDeque::new(),
            }),
        }
    }

    /// Discard any queued clips and make `epoch` the only accepted one.
    pub fn begin_epoch(&self, epoch: Epoch) {
        let mut inner = self.inner.lock();
        inner.epoch = epoch;
        inner.clips.clear();
    }

    /// Append a clip for `epoch`. Returns false when the epoch is stale,
    /// which tells the producer it has been superseded.
    pub fn push(&self, epoch: Epoch, clip: ReadyClip) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return false;
        }
        inner.clips.push_back(clip);
        true
    }

    /// Pop the front clip for `epoch`, if any.
    pub fn pop(&self, epoch: Epoch) -> Option<ReadyClip> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return None;
        }
        inner.clips.pop_front()
    }

    pub fn is_empty(&self, epoch: Epoch) -> bool {
        let inner = self.inner.lock();
        inner.epoch != epoch || inner.clips.is_empty()
    }

    /// Drop all pending clips without changing the accepted epoch.
    pub fn clear(&self) {
        self.inner.lock().clips.clear();
    }
}

impl Default for ClipQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clip(id: u32) -> ReadyClip {
        ReadyClip {
            sentence_id: id,
            path: PathBuf::from(format!("{}.wav", id)),
        }
    }

    #[test]
    fn fifo_order_within_an_epoch() {
        let queue = ClipQueue::new();
        let epoch = Epoch::next();
        queue.begin_epoch(epoch);
        assert!(queue.push(epoch, clip(0)));
        assert!(queue.push(epoch, clip(1)));
        assert_eq!(queue.pop(epoch).unwrap().sentence_id, 0);
        assert_eq!(queue.pop(epoch).unwrap().sentence_id, 1);
        assert!(queue.pop(epoch).is_none());
    }

    #[test]
    fn stale_epoch_appends_are_rejected() {
        let queue = ClipQueue::new();
        let old = Epoch::next();
        queue.begin_epoch(old);
        assert!(queue.push(old, clip(0)));

        let new = Epoch::next();
        queue.begin_epoch(new);
        // The old producer keeps going but its output is refused
        assert!(!queue.push(old, clip(1)));
        assert!(queue.pop(old).is_none());
        assert!(queue.is_empty(new));
    }

    #[test]
    fn begin_epoch_discards_pending_clips() {
        let queue = ClipQueue::new();
        let epoch = Epoch::next();
        queue.begin_epoch(epoch);
        queue.push(epoch, clip(0));
        let next = Epoch::next();
        queue.begin_epoch(next);
        assert!(queue.is_empty(next));
    }

    #[test]
    fn clear_keeps_epoch_valid() {
        let queue = ClipQueue::new();
        let epoch = Epoch::next();
        queue.begin_epoch(epoch);
        queue.push(epoch, clip(0));
        queue.clear();
        assert!(queue.is_empty(epoch));
        // Producer may still append after a stop cleared the backlog
        assert!(queue.push(epoch, clip(1)));
    }
}
