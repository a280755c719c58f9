//! Common types for Chime
//!
//! This module contains the fundamental audio types shared by the channel
//! pool, the mixer and the audio backend: 16-bit stereo frames, the
//! pre-allocated working buffer, sound handles and sound streams.

use std::fmt;
use std::ops::{Index, IndexMut};

use basedrop::{Handle, Shared};

use crate::engine::gc::gc_handle;

/// Default pool capacity (number of simultaneously allocated channels)
pub const DEFAULT_MAX_CHANNELS: usize = 32;

/// Bytes per stereo frame (two interleaved 16-bit samples)
pub const BYTES_PER_FRAME: usize = 4;

/// Audio sample type (signed 16-bit PCM)
pub type Sample = i16;

/// A single stereo frame (left and right samples)
///
/// Uses `#[repr(C)]` so `&[StereoFrame]` and interleaved `&[i16]`
/// [L, R, L, R, ...] can be cast into each other with bytemuck.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoFrame {
    pub left: Sample,
    pub right: Sample,
}

impl StereoFrame {
    /// Create a new stereo frame
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo frame
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono frame (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Add another frame, clamping each channel to the 16-bit range
    ///
    /// Returns true if either channel had to be clamped.
    #[inline]
    pub fn saturating_accumulate(&mut self, other: StereoFrame) -> bool {
        let (left, left_clipped) = saturating_sum(self.left, other.left);
        let (right, right_clipped) = saturating_sum(self.right, other.right);
        self.left = left;
        self.right = right;
        left_clipped || right_clipped
    }

    /// Average of both channels, for single-channel outputs
    #[inline]
    pub fn downmix(&self) -> Sample {
        ((self.left as i32 + self.right as i32) / 2) as Sample
    }
}

#[inline]
fn saturating_sum(a: Sample, b: Sample) -> (Sample, bool) {
    match a.checked_add(b) {
        Some(sum) => (sum, false),
        None => (a.saturating_add(b), true),
    }
}

/// A pre-allocated buffer of stereo frames
///
/// The audio callback renders into one of these. It is allocated once at
/// startup with [`FrameBuffer::silence`] and afterwards only resized within
/// its capacity, so it never allocates on the audio thread.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frames: Vec<StereoFrame>,
}

impl FrameBuffer {
    /// Create a buffer filled with silence
    pub fn silence(len: usize) -> Self {
        Self {
            frames: vec![StereoFrame::silence(); len],
        }
    }

    /// Create a buffer from interleaved samples [L, R, L, R, ...]
    pub fn from_interleaved(interleaved: &[Sample]) -> Self {
        assert!(interleaved.len() % 2 == 0, "Interleaved buffer must have even length");
        Self {
            frames: bytemuck::cast_slice(interleaved).to_vec(),
        }
    }

    /// Get the number of frames in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames the buffer can hold without reallocating
    #[inline]
    pub fn capacity(&self) -> usize {
        self.frames.capacity()
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Fills any newly exposed frames with silence. `new_len` must not
    /// exceed the capacity.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        let current_len = self.frames.len();
        if new_len > current_len {
            debug_assert!(
                new_len <= self.frames.capacity(),
                "set_len_from_capacity called with len > capacity"
            );
            self.frames.resize(new_len, StereoFrame::silence());
        } else {
            self.frames.truncate(new_len);
        }
    }

    /// Fill the buffer with silence
    pub fn fill_silence(&mut self) {
        self.frames.fill(StereoFrame::silence());
    }

    #[inline]
    pub fn as_slice(&self) -> &[StereoFrame] {
        &self.frames
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoFrame] {
        &mut self.frames
    }

    /// Zero-copy view of the frames as interleaved samples [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.frames)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StereoFrame> {
        self.frames.iter()
    }
}

impl Index<usize> for FrameBuffer {
    type Output = StereoFrame;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.frames[index]
    }
}

impl IndexMut<usize> for FrameBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.frames[index]
    }
}

/// Handle identifying a channel slot in the pool
///
/// Valid from the `add` that returned it until the matching `remove`, which
/// overwrites the caller's copy with [`SoundHandle::INVALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub(crate) usize);

impl SoundHandle {
    /// Sentinel for "no channel"
    pub const INVALID: SoundHandle = SoundHandle(usize::MAX);

    /// Slot index addressed by this handle
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }

    /// Whether this handle is not the invalid sentinel
    ///
    /// This says nothing about whether the slot is currently active in a
    /// given pool; use `ChannelPool::is_active` for that.
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for SoundHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

/// An immutable buffer of interleaved stereo 16-bit samples
///
/// Cloning is cheap (reference counted). The pool only ever holds clones;
/// the buffer itself is never copied or modified. The reference count is a
/// `basedrop::Shared`, so when the audio thread drops the last reference
/// the memory is released later on the collector thread.
#[derive(Clone)]
pub struct SoundStream {
    samples: Shared<Vec<Sample>>,
}

impl SoundStream {
    /// Wrap interleaved samples using an explicit collector handle
    pub fn new(handle: &Handle, samples: Vec<Sample>) -> Self {
        Self {
            samples: Shared::new(handle, samples),
        }
    }

    /// Wrap interleaved samples using the global collector
    pub fn from_interleaved(samples: Vec<Sample>) -> Self {
        Self::new(&gc_handle(), samples)
    }

    pub fn from_frames(frames: &[StereoFrame]) -> Self {
        Self::from_interleaved(bytemuck::cast_slice(frames).to_vec())
    }

    /// Build a stream from raw signed 16-bit little-endian PCM bytes
    ///
    /// A trailing odd byte is ignored.
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::from_interleaved(samples)
    }

    /// Length of the sample data in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.samples.len() * std::mem::size_of::<Sample>()
    }

    /// Number of whole stereo frames (`byte_len / 4`)
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.byte_len() / BYTES_PER_FRAME
    }

    /// The stream as stereo frames (a trailing odd sample is not included)
    #[inline]
    pub fn frames(&self) -> &[StereoFrame] {
        let whole = self.frame_count() * 2;
        bytemuck::cast_slice(&self.samples[..whole])
    }

    /// The raw interleaved samples
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl fmt::Debug for SoundStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundStream")
            .field("byte_len", &self.byte_len())
            .field("frames", &self.frame_count())
            .finish()
    }
}
