//! Audio output through CPAL
//!
//! The output stream follows the same lock-free split as the rest of the
//! mixer:
//!
//! - **Control thread**: drives a [`SoundController`](crate::engine::SoundController)
//! - **Audio thread**: owns the [`MixerEngine`](crate::engine::MixerEngine) inside the stream callback
//! - **Atomics**: status is read through relaxed atomics (no locks)
//!
//! ```ignore
//! use chime_core::audio::{start_audio_system, AudioConfig};
//! use chime_core::engine::mixer_channel;
//!
//! let (mut controller, engine) = mixer_channel(32);
//! let audio = start_audio_system(&AudioConfig::default(), engine)?;
//!
//! let handle = controller.add(stream, true, false)?;
//! println!("{} channels playing", audio.atomics.channels_playing());
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

pub use backend::{AudioHandle, AudioSystemResult};
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE,
    MIN_BUFFER_SIZE,
};
pub use cpal_backend::start_audio_system;
pub use device::{find_device_by_id, get_default_device, get_output_devices, AudioDevice};
pub use error::{AudioError, AudioResult};
