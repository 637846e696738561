//! Progress events and the delivery seam to the remote caller.
//!
//! The transport collaborator (a websocket handler, a CLI, a test harness)
//! supplies an [`EventSink`]; the pipeline reports progress through it. On
//! the wire the events collapse to the sentinel integers the caller expects:
//! `-2` about to start, `-1` finished, `>= 0` now playing that sentence.

use crate::error::DeliveryError;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Emitted before any generation or playback work begins
    Starting,
    /// The clip for this sentence just became audible
    Playing { sentence_id: u32 },
    /// The run drained completely (terminal, once per run)
    Finished,
}

impl PlaybackEvent {
    /// Sentinel integer used on the wire.
    pub fn wire_id(&self) -> i64 {
        match self {
            PlaybackEvent::Starting => -2,
            PlaybackEvent::Playing { sentence_id } => *sentence_id as i64,
            PlaybackEvent::Finished => -1,
        }
    }
}

/// Delivery seam for progress events.
///
/// A failed delivery means the caller is gone: the pipeline stops playback
/// immediately and does not retry.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, event: PlaybackEvent) -> Result<(), DeliveryError>;
}

/// Sink backed by an unbounded channel, for tests and local callers.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn deliver(&self, event: PlaybackEvent) -> Result<(), DeliveryError> {
        self.tx
            .send(event)
            .map_err(|_| DeliveryError("event receiver dropped".to_string()))
    }
}
