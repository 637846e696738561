//! Audio output device seam.
//!
//! The device is a process-wide, mutually exclusive resource: one clip
//! audible at a time plus a single look-ahead slot the engine refills to
//! keep playback gapless. The engine never queues while the slot is
//! occupied, so implementations only need depth 1.

use crate::error::DeviceError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub trait PlaybackDevice: Send + Sync {
    /// Start playing `clip` now, replacing anything loaded.
    fn play(&self, clip: &Path) -> Result<(), DeviceError>;

    /// Load `clip` into the look-ahead slot, to start when the current clip
    /// ends.
    fn queue(&self, clip: &Path) -> Result<(), DeviceError>;

    /// Whether the look-ahead slot is occupied.
    fn has_queued(&self) -> bool;

    /// Whether the device holds any clip (audible or paused).
    fn is_busy(&self) -> bool;

    fn pause(&self);

    fn resume(&self);

    /// Drop the current clip and the look-ahead slot.
    fn stop(&self);
}

/// Deterministic in-memory device for tests.
///
/// Time is explicit: each clip is "audible" for `ticks_per_clip` calls to
/// [`FakeDevice::tick`], and a tick that finishes the current clip promotes
/// the look-ahead slot. Pausing freezes ticks.
pub struct FakeDevice {
    ticks_per_clip: u32,
    inner: Mutex<FakeInner>,
}

#[derive(Default)]
struct FakeInner {
    current: Option<FakeClip>,
    queued: Option<PathBuf>,
    paused: bool,
    played: Vec<PathBuf>,
}

struct FakeClip {
    remaining: u32,
}

impl FakeDevice {
    pub fn new(ticks_per_clip: u32) -> Self {
        Self {
            ticks_per_clip,
            inner: Mutex::new(FakeInner::default()),
        }
    }

    /// Advance playback by one tick.
    pub fn tick(&self) {
        let mut inner = self.inner.lock();
        if inner.paused {
            return;
        }
        let finished = match inner.current.as_mut() {
            Some(clip) => {
                clip.remaining = clip.remaining.saturating_sub(1);
                clip.remaining == 0
            }
            None => false,
        };
        if finished {
            inner.current = None;
            // Promotion is the moment the look-ahead clip becomes audible
            if let Some(path) = inner.queued.take() {
                inner.current = Some(FakeClip {
                    remaining: self.ticks_per_clip,
                });
                inner.played.push(path);
            }
        }
    }

    /// Every clip that has become audible, in order.
    pub fn played(&self) -> Vec<PathBuf> {
        self.inner.lock().played.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }
}

impl PlaybackDevice for FakeDevice {
    fn play(&self, clip: &Path) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        inner.current = Some(FakeClip {
            remaining: self.ticks_per_clip,
        });
        inner.queued = None;
        inner.paused = false;
        inner.played.push(clip.to_path_buf());
        Ok(())
    }

    fn queue(&self, clip: &Path) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        if inner.queued.is_some() {
            return Err(DeviceError::BadClip(
                "look-ahead slot already occupied".to_string(),
            ));
        }
        inner.queued = Some(clip.to_path_buf());
        Ok(())
    }

    fn has_queued(&self) -> bool {
        self.inner.lock().queued.is_some()
    }

    fn is_busy(&self) -> bool {
        self.inner.lock().current.is_some()
    }

    fn pause(&self) {
        self.inner.lock().paused = true;
    }

    fn resume(&self) {
        self.inner.lock().paused = false;
    }

    fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.current = None;
        inner.queued = None;
        inner.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_finishes_after_configured_ticks() {
        let device = FakeDevice::new(2);
        device.play(Path::new("0.wav")).unwrap();
        assert!(device.is_busy());
        device.tick();
        assert!(device.is_busy());
        device.tick();
        assert!(!device.is_busy());
    }

    #[test]
    fn lookahead_promotes_on_finish() {
        let device = FakeDevice::new(1);
        device.play(Path::new("0.wav")).unwrap();
        device.queue(Path::new("1.wav")).unwrap();
        assert!(device.has_queued());
        device.tick();
        assert!(device.is_busy());
        assert!(!device.has_queued());
        assert_eq!(
            device.played(),
            vec![PathBuf::from("0.wav"), PathBuf::from("1.wav")]
        );
    }

    #[test]
    fn pause_freezes_progress() {
        let device = FakeDevice::new(1);
        device.play(Path::new("0.wav")).unwrap();
        device.pause();
        device.tick();
        device.tick();
        assert!(device.is_busy());
        device.resume();
        device.tick();
        assert!(!device.is_busy());
    }

    #[test]
    fn second_queue_is_rejected() {
        let device = FakeDevice::new(4);
        device.play(Path::new("0.wav")).unwrap();
        device.queue(Path::new("1.wav")).unwrap();
        assert!(device.queue(Path::new("2.wav")).is_err());
    }

    #[test]
    fn stop_clears_everything() {
        let device = FakeDevice::new(4);
        device.play(Path::new("0.wav")).unwrap();
        device.queue(Path::new("1.wav")).unwrap();
        device.stop();
        assert!(!device.is_busy());
        assert!(!device.has_queued());
    }
}
