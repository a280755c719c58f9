//! A single channel slot

use crate::types::SoundStream;

/// Link value meaning "no neighbour"
pub(crate) const NIL: usize = usize::MAX;

/// One slot of the channel pool
///
/// Carries the playback state of the assigned stream and the intrusive
/// `next`/`prev` links. While the slot is free only `next` is meaningful
/// (it chains the free list) and `prev` is never read.
#[derive(Debug, Clone)]
pub struct Channel {
    /// Assigned stream, `None` while the slot is free
    pub(crate) stream: Option<SoundStream>,
    /// Stream length in stereo frames
    pub(crate) sample_count: usize,
    /// Playback position in stereo frames
    pub(crate) current_sample: usize,
    pub(crate) next: usize,
    pub(crate) prev: usize,
    pub(crate) looping: bool,
    pub(crate) playing: bool,
    /// Whether the slot is on the active list
    pub(crate) active: bool,
}

impl Channel {
    pub(crate) fn empty() -> Self {
        Self {
            stream: None,
            sample_count: 0,
            current_sample: 0,
            next: NIL,
            prev: NIL,
            looping: false,
            playing: false,
            active: false,
        }
    }

    /// Assign a stream and reset the playback position
    pub(crate) fn assign(&mut self, stream: SoundStream, playing: bool, looping: bool) {
        self.sample_count = stream.frame_count();
        self.current_sample = 0;
        self.stream = Some(stream);
        self.playing = playing;
        self.looping = looping;
        self.active = true;
    }

    /// Drop the stream reference and mark the slot free
    ///
    /// Links are left to the caller.
    pub(crate) fn release(&mut self) {
        self.stream = None;
        self.sample_count = 0;
        self.current_sample = 0;
        self.playing = false;
        self.looping = false;
        self.active = false;
    }

    pub fn stream(&self) -> Option<&SoundStream> {
        self.stream.as_ref()
    }

    /// Stream length in stereo frames
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Playback position in stereo frames
    pub fn current_sample(&self) -> usize {
        self.current_sample
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
