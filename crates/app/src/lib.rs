//! VoxChat application crate: configuration loading and runtime wiring for
//! the sentence playback pipeline.

pub mod config;
pub mod runtime;
