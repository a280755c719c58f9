//! Mixer configuration

use serde::{Deserialize, Serialize};

use crate::audio::{AudioConfig, BufferSize};
use crate::engine::COMMAND_QUEUE_CAPACITY;
use crate::types::DEFAULT_MAX_CHANNELS;

/// Largest pool accepted from a config file
pub const MAX_CHANNELS_LIMIT: usize = 4096;

/// Largest command queue accepted from a config file
pub const MAX_COMMAND_QUEUE_CAPACITY: usize = 65536;

/// Persisted mixer settings
///
/// Missing fields fall back to their defaults, so a partial file such as
/// `max_channels: 8` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Number of channel slots in the pool
    pub max_channels: usize,

    /// Commands that can be queued between two render quanta
    pub command_queue_capacity: usize,

    /// Output device and stream settings
    pub audio: AudioConfig,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            max_channels: DEFAULT_MAX_CHANNELS,
            command_queue_capacity: COMMAND_QUEUE_CAPACITY,
            audio: AudioConfig::default(),
        }
    }
}

impl MixerConfig {
    /// Clamp fields to values the mixer can run with
    ///
    /// - `max_channels` and `command_queue_capacity` to at least 1 and at
    ///   most [`MAX_CHANNELS_LIMIT`] / [`MAX_COMMAND_QUEUE_CAPACITY`]
    /// - a fixed buffer size to the range [`BufferSize::frames`] would use
    /// - a zero sample rate to the default rate
    ///
    /// Logs each change and returns true if anything was adjusted.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        let channels = self.max_channels.clamp(1, MAX_CHANNELS_LIMIT);
        if channels != self.max_channels {
            log::warn!("max_channels {} out of range, using {}", self.max_channels, channels);
            self.max_channels = channels;
            changed = true;
        }

        let queue = self.command_queue_capacity.clamp(1, MAX_COMMAND_QUEUE_CAPACITY);
        if queue != self.command_queue_capacity {
            log::warn!(
                "command_queue_capacity {} out of range, using {}",
                self.command_queue_capacity,
                queue
            );
            self.command_queue_capacity = queue;
            changed = true;
        }

        if let BufferSize::Fixed(frames) = self.audio.buffer_size {
            let clamped = self.audio.buffer_size.frames();
            if clamped != frames {
                log::warn!("buffer_size {} frames out of range, using {}", frames, clamped);
                self.audio.buffer_size = BufferSize::Fixed(clamped);
                changed = true;
            }
        }

        if self.audio.sample_rate == Some(0) {
            log::warn!("sample_rate 0 is invalid, using the default rate");
            self.audio.sample_rate = None;
            changed = true;
        }

        changed
    }
}
