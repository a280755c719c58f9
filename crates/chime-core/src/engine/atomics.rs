//! Lock-free mixer status for the control thread

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Mixer state published by the audio thread after every render quantum
///
/// All loads and stores are relaxed: the values are for display and
/// diagnostics, not for synchronizing with the pool.
#[derive(Debug, Default)]
pub struct MixerAtomics {
    /// Channels on the live pool's active list
    pub channels_used: AtomicUsize,
    /// Active channels flagged as playing after the last quantum
    pub channels_playing: AtomicUsize,
    /// Set when a saturating sum clamped; cleared by [`MixerAtomics::take_clip`]
    pub clip_active: AtomicBool,
    /// Render quanta processed so far
    pub quanta_rendered: AtomicU64,
    /// Queued commands the live pool rejected
    ///
    /// The controller validates against a shadow pool before queueing, so a
    /// non-zero value means the two pools diverged.
    pub rejected_commands: AtomicU64,
    /// Storage freed on the audio thread because the retire queue was full
    pub retire_overflows: AtomicU64,
}

impl MixerAtomics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn channels_used(&self) -> usize {
        self.channels_used.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn channels_playing(&self) -> usize {
        self.channels_playing.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn quanta_rendered(&self) -> u64 {
        self.quanta_rendered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_commands(&self) -> u64 {
        self.rejected_commands.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn retire_overflows(&self) -> u64 {
        self.retire_overflows.load(Ordering::Relaxed)
    }

    /// Read and clear the clip indicator
    #[inline]
    pub fn take_clip(&self) -> bool {
        self.clip_active.swap(false, Ordering::Relaxed)
    }
}
