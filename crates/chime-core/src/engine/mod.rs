//! Mixer engine - render routine, command queue and thread split
//!
//! This module contains the real-time side of the sound system:
//! - Mixer: walks the active list and sums playing channels with saturation
//! - Command queue: lock-free SPSC ring buffer from control to audio thread
//! - SoundController: control-thread API, validates against a shadow pool
//! - MixerEngine: audio-thread owner of the live pool
//! - MixerAtomics: lock-free status readable from any thread
//! - gc: deferred deallocation of sound buffers dropped on the audio thread

mod atomics;
mod command;
mod controller;
mod engine;
pub mod gc;
mod mixer;

pub use atomics::*;
pub use command::*;
pub use controller::*;
pub use engine::*;
pub use mixer::*;
