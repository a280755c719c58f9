//! Handles returned when the audio output starts

use std::sync::Arc;

use cpal::Stream;

use crate::engine::MixerAtomics;

/// Result of starting the audio system
pub struct AudioSystemResult {
    /// Handle to keep audio alive (drop to stop)
    pub handle: AudioHandle,
    /// Mixer status published by the audio thread
    pub atomics: Arc<MixerAtomics>,
    /// Sample rate the stream runs at
    pub sample_rate: u32,
    /// Requested buffer size in frames
    pub buffer_size: u32,
    /// Audio latency in milliseconds (one-way, output only)
    pub latency_ms: f32,
}

/// Handle to the running output stream
///
/// Owns the stream, and through it the mixer engine moved into the
/// callback. Drop this to stop audio.
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioHandle {
    pub(crate) fn new(stream: Stream, sample_rate: u32, buffer_size: u32) -> Self {
        Self {
            _stream: stream,
            sample_rate,
            buffer_size,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Get the audio latency in milliseconds (one-way, output only)
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}
