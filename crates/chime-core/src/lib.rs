//! Chime Core - fixed-capacity sound channel pool and real-time 16-bit mixer
//!
//! A pool of pre-allocated channel slots, each holding a reference to an
//! immutable stereo 16-bit sound buffer plus playback state, and a mixer that
//! sums every playing channel into an output buffer with saturation.
//!
//! The control thread drives a [`engine::SoundController`]; the audio thread
//! owns the live pool inside a [`engine::MixerEngine`] and applies queued
//! commands at the start of each render quantum.

pub mod audio;
pub mod config;
pub mod engine;
pub mod pool;
pub mod types;

pub use types::*;
