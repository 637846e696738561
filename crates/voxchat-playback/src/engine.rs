//! Playback engine: owns the output device, drains the clip queue, and
//! derives sentence-progress events from channel occupancy.
//!
//! The drain loop never asks the device for timestamps. It watches the
//! look-ahead slot: the poll at which the slot goes from occupied to
//! refillable (or to empty) is the poll at which the previous clip finished
//! and the look-ahead clip became audible. That bookkeeping lives in
//! [`DrainState`] so it can be unit-tested against a fake device.

use crate::device::PlaybackDevice;
use crate::error::{DeviceError, PlaybackError};
use crate::events::{EventSink, PlaybackEvent};
use crate::queue::ClipQueue;
use crate::types::Epoch;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use voxchat_foundation::{PlaybackState, PlaybackStateMachine};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Drain loop poll interval. Bounds notification latency; 100ms in
    /// production, shorter in tests.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// One poll step's outcome.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DrainStep {
    Idle,
    NowPlaying(u32),
}

/// Explicit look-ahead bookkeeping for the drain loop.
pub(crate) struct DrainState {
    /// Sentence currently audible
    current: u32,
    /// Sentence sitting in the device's look-ahead slot
    lookahead: Option<u32>,
    /// Whether the look-ahead slot was seen occupied since the last
    /// transition
    had_queued: bool,
}

impl DrainState {
    pub(crate) fn new(first_sentence: u32) -> Self {
        Self {
            current: first_sentence,
            lookahead: None,
            had_queued: false,
        }
    }

    pub(crate) fn current(&self) -> u32 {
        self.current
    }

    /// Run one poll iteration: refill the look-ahead slot from the queue
    /// and detect the moment a queued clip became audible.
    pub(crate) fn step(
        &mut self,
        device: &dyn PlaybackDevice,
        queue: &ClipQueue,
        epoch: Epoch,
    ) -> Result<DrainStep, DeviceError> {
        if device.has_queued() {
            self.had_queued = true;
            return Ok(DrainStep::Idle);
        }

        if let Some(clip) = queue.pop(epoch) {
            device.queue(&clip.path)?;
            let step = if self.had_queued {
                // The clip that occupied the slot is audible now
                self.current = self.lookahead.take().unwrap_or(self.current + 1);
                DrainStep::NowPlaying(self.current)
            } else {
                DrainStep::Idle
            };
            // Occupied from this instant, even if the device promotes the
            // clip before the next poll observes the slot
            self.had_queued = true;
            self.lookahead = Some(clip.sentence_id);
            return Ok(step);
        }

        if self.had_queued {
            self.had_queued = false;
            self.current = self.lookahead.take().unwrap_or(self.current + 1);
            return Ok(DrainStep::NowPlaying(self.current));
        }

        Ok(DrainStep::Idle)
    }
}

/// Outcome of one drain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Last sentence that became audible, if any clip played at all
    pub last_played: Option<u32>,
}

/// Owns the single active output channel. Exactly one run may hold the
/// device at a time; starting a new run goes through [`PlaybackEngine::begin`]
/// which stops whatever held it before.
pub struct PlaybackEngine {
    device: Arc<dyn PlaybackDevice>,
    queue: Arc<ClipQueue>,
    state: PlaybackStateMachine,
    /// Latch distinguishing a deliberate stop from a starved-queue stall.
    /// Set by `stop()`, cleared when the next run begins.
    stopping: AtomicBool,
    /// One-shot abort flag of the current generation worker. Each worker
    /// gets its own flag; raising always targets the current one, so a
    /// stale raise can never abort a newer worker.
    stop_generating: parking_lot::Mutex<Arc<AtomicBool>>,
    config: EngineConfig,
}

impl PlaybackEngine {
    pub fn new(device: Arc<dyn PlaybackDevice>, config: EngineConfig) -> Self {
        Self {
            device,
            queue: Arc::new(ClipQueue::new()),
            state: PlaybackStateMachine::new(),
            stopping: AtomicBool::new(false),
            stop_generating: parking_lot::Mutex::new(Arc::new(AtomicBool::new(false))),
            config,
        }
    }

    pub fn queue(&self) -> Arc<ClipQueue> {
        self.queue.clone()
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Install a fresh one-shot abort flag for a new generation worker and
    /// hand it out for the worker to consume.
    pub fn new_generation_flag(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        *self.stop_generating.lock() = flag.clone();
        flag
    }

    /// Ask the current generation worker to abandon its remaining work.
    pub fn request_stop_generating(&self) {
        self.stop_generating.lock().store(true, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.device.is_busy()
    }

    /// Whether the last interruption was a deliberate caller stop.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        if self.state.current() == PlaybackState::Playing {
            self.device.pause();
            let _ = self.state.transition(PlaybackState::Paused);
        }
    }

    pub fn resume(&self) {
        if self.state.current() == PlaybackState::Paused {
            self.device.resume();
            let _ = self.state.transition(PlaybackState::Playing);
        }
    }

    /// Deliberate cancellation: mark stopping first so the orchestrator can
    /// tell this apart from a stall, then clear pending playback. The latch
    /// is set unconditionally; a stop issued while the run is still waiting
    /// for its first clip must be honored too.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        let state = self.state.current();
        if state == PlaybackState::Playing || state == PlaybackState::Paused {
            let _ = self.state.transition(PlaybackState::Stopping);
        }
        self.queue.clear();
        self.device.stop();
    }

    /// Take exclusive ownership of the device for a new run: stop whatever
    /// holds it, rebind the queue to `epoch`, reset the stop latch.
    pub fn begin(&self, epoch: Epoch) {
        let state = self.state.current();
        if state != PlaybackState::Idle {
            self.device.stop();
            let _ = self.state.transition(PlaybackState::Stopping);
            let _ = self.state.transition(PlaybackState::Idle);
        }
        self.queue.begin_epoch(epoch);
        self.stopping.store(false, Ordering::SeqCst);
    }

    /// Drain loop: play the first queued clip, keep the device's look-ahead
    /// slot fed, emit one `Playing` event per sentence transition and a
    /// single terminal `Finished`.
    ///
    /// Returns the last sentence that became audible so the orchestrator
    /// can apply its catch-up policy. A delivery failure halts the device
    /// and propagates.
    pub async fn run(
        &self,
        epoch: Epoch,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome, PlaybackError> {
        let first = match self.queue.pop(epoch) {
            Some(clip) => clip,
            None => {
                // Queue cleared between the caller's wait and this run
                debug!("Drain run found an empty queue; nothing to play");
                if let Err(e) = sink.deliver(PlaybackEvent::Finished).await {
                    self.halt_for_lost_caller();
                    return Err(e.into());
                }
                return Ok(RunOutcome { last_played: None });
            }
        };

        self.device.play(&first.path)?;
        let _ = self.state.transition(PlaybackState::Playing);

        if let Err(e) = sink
            .deliver(PlaybackEvent::Playing {
                sentence_id: first.sentence_id,
            })
            .await
        {
            self.halt_for_lost_caller();
            return Err(e.into());
        }

        let mut drain = DrainState::new(first.sentence_id);
        while self.device.is_busy() {
            match drain.step(self.device.as_ref(), &self.queue, epoch) {
                Ok(DrainStep::NowPlaying(sentence_id)) => {
                    if let Err(e) = sink.deliver(PlaybackEvent::Playing { sentence_id }).await {
                        self.halt_for_lost_caller();
                        return Err(e.into());
                    }
                }
                Ok(DrainStep::Idle) => {}
                Err(e) => {
                    warn!("Device rejected clip during drain: {}", e);
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        if self.state.current() != PlaybackState::Idle {
            let _ = self.state.transition(PlaybackState::Idle);
        }

        if let Err(e) = sink.deliver(PlaybackEvent::Finished).await {
            self.halt_for_lost_caller();
            return Err(e.into());
        }
        Ok(RunOutcome {
            last_played: Some(drain.current()),
        })
    }

    fn halt_for_lost_caller(&self) {
        warn!("Event sink unreachable; stopping playback");
        self.queue.clear();
        self.device.stop();
        self.request_stop_generating();
        let state = self.state.current();
        if state == PlaybackState::Playing || state == PlaybackState::Paused {
            let _ = self.state.transition(PlaybackState::Stopping);
        }
        if self.state.current() == PlaybackState::Stopping {
            let _ = self.state.transition(PlaybackState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FakeDevice;
    use crate::types::ReadyClip;
    use std::path::PathBuf;

    fn clip(id: u32) -> ReadyClip {
        ReadyClip {
            sentence_id: id,
            path: PathBuf::from(format!("{}.wav", id)),
        }
    }

    /// Drive the drain state through a scripted two-clip playback and check
    /// the transition event fires exactly when the look-ahead clip starts.
    #[test]
    fn drain_detects_transition_via_lookahead_slot() {
        let device = FakeDevice::new(2);
        let queue = ClipQueue::new();
        let epoch = Epoch::next();
        queue.begin_epoch(epoch);
        queue.push(epoch, clip(1));

        device.play(&PathBuf::from("0.wav")).unwrap();
        let mut drain = DrainState::new(0);

        // Poll 1: queue drains into the look-ahead slot, no event yet
        assert_eq!(drain.step(&device, &queue, epoch).unwrap(), DrainStep::Idle);
        assert!(device.has_queued());

        // Poll 2: slot occupied
        assert_eq!(drain.step(&device, &queue, epoch).unwrap(), DrainStep::Idle);

        // Clip 0 finishes; the device promotes clip 1
        device.tick();
        device.tick();
        assert!(device.is_busy());
        assert!(!device.has_queued());

        // Poll 3: slot emptied with nothing left to queue => transition
        assert_eq!(
            drain.step(&device, &queue, epoch).unwrap(),
            DrainStep::NowPlaying(1)
        );
        assert_eq!(drain.current(), 1);

        // Clip 1 finishes; loop would exit on !is_busy
        device.tick();
        device.tick();
        assert!(!device.is_busy());
    }

    /// Transition events carry the real id of the promoted clip even when
    /// sentence ids are sparse.
    #[test]
    fn drain_tracks_sparse_sentence_ids() {
        let device = FakeDevice::new(1);
        let queue = ClipQueue::new();
        let epoch = Epoch::next();
        queue.begin_epoch(epoch);
        queue.push(epoch, clip(5));
        queue.push(epoch, clip(9));

        device.play(&PathBuf::from("2.wav")).unwrap();
        let mut drain = DrainState::new(2);

        assert_eq!(drain.step(&device, &queue, epoch).unwrap(), DrainStep::Idle);
        assert_eq!(drain.step(&device, &queue, epoch).unwrap(), DrainStep::Idle);
        device.tick(); // 2 ends, 5 audible

        // Slot refills from the queue; event names 5, not 3
        assert_eq!(
            drain.step(&device, &queue, epoch).unwrap(),
            DrainStep::NowPlaying(5)
        );
        device.tick(); // 5 ends, 9 audible
        assert_eq!(
            drain.step(&device, &queue, epoch).unwrap(),
            DrainStep::NowPlaying(9)
        );
        assert_eq!(drain.current(), 9);
    }

    #[test]
    fn stop_marks_stopping_before_clearing() {
        let device = Arc::new(FakeDevice::new(4));
        let engine = PlaybackEngine::new(device.clone(), EngineConfig::default());
        let epoch = Epoch::next();
        engine.begin(epoch);
        engine.queue().push(epoch, clip(0));

        // Simulate a running drain holding the device
        device.play(&PathBuf::from("0.wav")).unwrap();
        let _ = engine.state.transition(PlaybackState::Playing);

        engine.stop();
        assert!(engine.is_stopping());
        assert!(!device.is_busy());
        assert!(engine.queue().is_empty(epoch));

        // A new run resets the latch
        engine.begin(Epoch::next());
        assert!(!engine.is_stopping());
    }

    /// A stop issued while the run is still waiting for its first clip
    /// (engine state still Idle) must set the latch so the wait breaks.
    #[test]
    fn stop_latches_before_any_clip_plays() {
        let device = Arc::new(FakeDevice::new(4));
        let engine = PlaybackEngine::new(device, EngineConfig::default());
        let epoch = Epoch::next();
        engine.begin(epoch);
        assert_eq!(engine.state.current(), PlaybackState::Idle);

        engine.stop();
        assert!(engine.is_stopping());
    }

    struct LimitedSink {
        allowed: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EventSink for LimitedSink {
        async fn deliver(&self, _event: PlaybackEvent) -> Result<(), crate::error::DeliveryError> {
            let left = self.allowed.load(Ordering::SeqCst);
            if left == 0 {
                return Err(crate::error::DeliveryError("caller gone".to_string()));
            }
            self.allowed.store(left - 1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Losing the caller on the terminal event must go through the same
    /// halt path as mid-run deliveries, raising the generation stop so a
    /// lagging worker stands down.
    #[tokio::test(flavor = "multi_thread")]
    async fn lost_caller_at_run_end_raises_the_generation_stop() {
        let device = Arc::new(FakeDevice::new(1));
        let engine = PlaybackEngine::new(
            device.clone(),
            EngineConfig {
                poll_interval: Duration::from_millis(2),
            },
        );
        let epoch = Epoch::next();
        engine.begin(epoch);
        engine.queue().push(epoch, clip(0));
        let flag = engine.new_generation_flag();

        let ticker = device.clone();
        tokio::spawn(async move {
            loop {
                ticker.tick();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        });

        // Playing(0) gets through, the terminal delivery fails
        let sink = LimitedSink {
            allowed: std::sync::atomic::AtomicUsize::new(1),
        };
        let result = engine.run(epoch, &sink).await;

        assert!(result.is_err());
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn stop_generating_flag_is_one_shot() {
        let device = Arc::new(FakeDevice::new(4));
        let engine = PlaybackEngine::new(device, EngineConfig::default());
        let flag = engine.new_generation_flag();

        engine.request_stop_generating();
        assert!(flag.swap(false, Ordering::SeqCst));
        // Consumed: a second reader sees it lowered
        assert!(!flag.swap(false, Ordering::SeqCst));
    }

    #[test]
    fn stale_raise_cannot_abort_a_newer_worker() {
        let device = Arc::new(FakeDevice::new(4));
        let engine = PlaybackEngine::new(device, EngineConfig::default());
        let old_flag = engine.new_generation_flag();
        engine.request_stop_generating();

        // A newer worker installs its own flag; the earlier raise stays
        // with the superseded worker
        let new_flag = engine.new_generation_flag();
        assert!(old_flag.load(Ordering::SeqCst));
        assert!(!new_flag.load(Ordering::SeqCst));
    }
}
