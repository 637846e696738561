//! Sentence-level audio generation and playback pipeline for VoxChat
//!
//! Turns an ordered sequence of text sentences into synthesized audio clips,
//! queues them for gapless playback on a single shared output device, and
//! reports exactly which sentence is audible at any instant through an
//! injected event sink. A background generation worker races a foreground
//! drain loop over an epoch-guarded clip queue; playback recovers
//! automatically (catch-up restart) when it overtakes generation.

pub mod cache;
pub mod device;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod orchestrator;
pub mod queue;
pub mod rodio_device;
pub mod types;

pub use cache::ClipCache;
pub use device::{FakeDevice, PlaybackDevice};
pub use engine::{EngineConfig, PlaybackEngine};
pub use error::{DeliveryError, DeviceError, PlaybackError};
pub use events::{ChannelSink, EventSink, PlaybackEvent};
pub use generator::{GenerationRequest, GenerationSummary};
pub use orchestrator::{PlayRequest, PlaybackOrchestrator};
pub use queue::ClipQueue;
pub use rodio_device::RodioDevice;
pub use types::{Epoch, ReadyClip, Sentence};
