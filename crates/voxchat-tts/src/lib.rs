//! Text-to-speech abstraction layer for VoxChat
//!
//! This crate provides the types and traits for sentence synthesis: the
//! engine trait, synthesis configuration, voice metadata, and the SSML
//! rate-adjustment document used when a non-native speech rate is requested.

pub mod engine;
pub mod error;
pub mod ssml;
pub mod types;

pub use engine::TtsEngine;
pub use error::{TtsError, TtsResult};
pub use types::{SynthesisOptions, TtsConfig, VoiceGender, VoiceInfo};
