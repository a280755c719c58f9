//! Channel pool with intrusive free and active lists

use crate::types::{SoundHandle, SoundStream};

use super::channel::{Channel, NIL};
use super::error::{PoolError, PoolResult};

/// Fixed-capacity pool of mixer channels
///
/// Slots are addressed by [`SoundHandle`]. `add` pops the head of the free
/// list and pushes it onto the head of the active list; `remove` does the
/// reverse. Capacity is fixed by [`ChannelPool::new`] / [`ChannelPool::initialize`]
/// and list operations never allocate, so a pool can be owned by the audio
/// thread.
///
/// The pool is not synchronized. In the threaded setup it is owned by
/// [`MixerEngine`](crate::engine::MixerEngine) and only mutated from the
/// audio callback; other threads go through
/// [`SoundController`](crate::engine::SoundController).
#[derive(Debug)]
pub struct ChannelPool {
    channels: Box<[Channel]>,
    /// Head of the active list
    first: usize,
    /// Head of the free list
    first_free: usize,
    channels_used: usize,
    channels_count: usize,
    initialized: bool,
}

impl ChannelPool {
    /// Create and initialize a pool holding `capacity` channels
    pub fn new(capacity: usize) -> Self {
        let mut pool = Self::uninitialized();
        pool.initialize(capacity);
        pool
    }

    /// Create a pool with no backing storage
    ///
    /// Every control operation fails with [`PoolError::NotInitialized`] and
    /// the mixer renders silence until [`ChannelPool::initialize`] is called.
    pub fn uninitialized() -> Self {
        Self {
            channels: Box::default(),
            first: NIL,
            first_free: NIL,
            channels_used: 0,
            channels_count: 0,
            initialized: false,
        }
    }

    /// Allocate `capacity` zeroed channels and chain them all onto the free list
    ///
    /// The free list is built as 0 → 1 → … → capacity-1. Node `i` also gets
    /// `prev = i - 1`, matching how a released active node is relinked,
    /// although the free list is never walked backwards. Initializing a pool
    /// that is already initialized discards its channels first.
    pub fn initialize(&mut self, capacity: usize) {
        let channels: Box<[Channel]> = (0..capacity)
            .map(|i| {
                let mut channel = Channel::empty();
                channel.next = if i + 1 < capacity { i + 1 } else { NIL };
                channel.prev = if i == 0 { NIL } else { i - 1 };
                channel
            })
            .collect();

        self.channels = channels;
        self.first = NIL;
        self.first_free = if capacity > 0 { 0 } else { NIL };
        self.channels_used = 0;
        self.channels_count = capacity;
        self.initialized = true;
    }

    /// Release the backing storage
    ///
    /// Returns the released channels so a caller on the audio thread can
    /// hand them to another thread for deallocation; dropping the return
    /// value frees them in place. Calling this on a pool that is already
    /// shut down is a no-op returning `None`.
    pub fn shutdown(&mut self) -> Option<Box<[Channel]>> {
        if !self.initialized {
            return None;
        }
        let channels = std::mem::take(&mut self.channels);
        self.first = NIL;
        self.first_free = NIL;
        self.channels_used = 0;
        self.channels_count = 0;
        self.initialized = false;
        Some(channels)
    }

    /// Assign `stream` to a free channel and make it active
    ///
    /// The returned handle addresses this exact assignment until it is
    /// passed to [`ChannelPool::remove`].
    pub fn add(&mut self, stream: SoundStream, playing: bool, looping: bool) -> PoolResult<SoundHandle> {
        if !self.initialized {
            return Err(PoolError::NotInitialized);
        }
        if self.channels_used + 1 > self.channels_count {
            return Err(PoolError::PoolFull);
        }

        let index = self.first_free;
        if index >= self.channels_count {
            return Err(PoolError::FreeListCorrupt { head: index });
        }

        let old_first = self.first;
        let channel = &mut self.channels[index];

        // Pop from the free list
        self.first_free = channel.next;

        channel.assign(stream, playing, looping);

        // Push onto the head of the active list
        channel.next = old_first;
        channel.prev = NIL;
        self.first = index;
        self.channels_used += 1;

        if old_first != NIL {
            self.channels[old_first].prev = index;
        }

        Ok(SoundHandle(index))
    }

    /// Return the channel addressed by `handle` to the free list
    ///
    /// On success the caller's handle is overwritten with
    /// [`SoundHandle::INVALID`] so it cannot be reused.
    pub fn remove(&mut self, handle: &mut SoundHandle) -> PoolResult<()> {
        let index = self.active_index(*handle)?;

        // Splice out of the active list
        let (prev, next) = {
            let channel = &self.channels[index];
            (channel.prev, channel.next)
        };
        if prev == NIL {
            self.first = next;
        } else {
            self.channels[prev].next = next;
        }
        if next != NIL {
            self.channels[next].prev = prev;
        }

        // Push onto the head of the free list
        let channel = &mut self.channels[index];
        channel.release();
        channel.prev = NIL;
        channel.next = self.first_free;
        self.first_free = index;

        self.channels_used -= 1;
        *handle = SoundHandle::INVALID;
        Ok(())
    }

    /// Let the mixer play the channel from its current position
    pub fn play(&mut self, handle: SoundHandle) -> PoolResult<()> {
        let index = self.active_index(handle)?;
        self.channels[index].playing = true;
        Ok(())
    }

    /// Stop mixing the channel, keeping its position
    pub fn pause(&mut self, handle: SoundHandle) -> PoolResult<()> {
        let index = self.active_index(handle)?;
        self.channels[index].playing = false;
        Ok(())
    }

    /// Stop the channel and rewind it to the start
    ///
    /// The channel stays allocated; call [`ChannelPool::play`] to hear it again.
    pub fn restart(&mut self, handle: SoundHandle) -> PoolResult<()> {
        let index = self.active_index(handle)?;
        let channel = &mut self.channels[index];
        channel.playing = false;
        channel.current_sample = 0;
        Ok(())
    }

    /// Index of an active channel, or the reason the handle is unusable
    fn active_index(&self, handle: SoundHandle) -> PoolResult<usize> {
        if !self.initialized {
            return Err(PoolError::NotInitialized);
        }
        match self.channels.get(handle.0) {
            Some(channel) if channel.active => Ok(handle.0),
            _ => Err(PoolError::InvalidHandle(handle)),
        }
    }

    /// Visit every active channel, head to tail
    ///
    /// The successor is read before `f` runs, so `f` may change the
    /// channel's playback state without affecting the walk. The walk is
    /// bounded by the capacity and stops at an out-of-range link instead of
    /// panicking.
    pub(crate) fn for_each_active_mut(&mut self, mut f: impl FnMut(&mut Channel)) {
        let mut index = self.first;
        let mut steps = 0;
        while index != NIL && steps < self.channels_count {
            let Some(channel) = self.channels.get_mut(index) else {
                break;
            };
            let next = channel.next;
            f(channel);
            index = next;
            steps += 1;
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Total number of channel slots
    pub fn capacity(&self) -> usize {
        self.channels_count
    }

    /// Number of channels on the active list
    pub fn channels_used(&self) -> usize {
        self.channels_used
    }

    pub fn is_full(&self) -> bool {
        self.channels_used >= self.channels_count
    }

    /// Whether `handle` currently addresses an active channel
    pub fn is_active(&self, handle: SoundHandle) -> bool {
        self.active_index(handle).is_ok()
    }

    pub fn channel(&self, handle: SoundHandle) -> PoolResult<&Channel> {
        let index = self.active_index(handle)?;
        Ok(&self.channels[index])
    }

    /// Whether the channel is currently being mixed (false for invalid handles)
    pub fn is_playing(&self, handle: SoundHandle) -> bool {
        self.channel(handle).map(|c| c.playing).unwrap_or(false)
    }

    /// Playback position in frames
    pub fn position(&self, handle: SoundHandle) -> Option<usize> {
        self.channel(handle).ok().map(|c| c.current_sample)
    }

    /// Number of channels currently flagged as playing
    pub fn channels_playing(&self) -> usize {
        self.active_handles()
            .filter(|h| self.channels[h.0].playing)
            .count()
    }

    /// Iterate the active list from its head
    pub fn active_handles(&self) -> ActiveHandles<'_> {
        ActiveHandles {
            pool: self,
            cursor: self.first,
            remaining: self.channels_count,
        }
    }

    /// Length of the free list (walked, not cached)
    pub fn free_count(&self) -> usize {
        let mut index = self.first_free;
        let mut count = 0;
        while index != NIL && count < self.channels_count {
            match self.channels.get(index) {
                Some(channel) => index = channel.next,
                None => break,
            }
            count += 1;
        }
        count
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::uninitialized()
    }
}

/// Iterator over the handles on the active list
pub struct ActiveHandles<'a> {
    pool: &'a ChannelPool,
    cursor: usize,
    remaining: usize,
}

impl Iterator for ActiveHandles<'_> {
    type Item = SoundHandle;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL || self.remaining == 0 {
            return None;
        }
        let channel = self.pool.channels.get(self.cursor)?;
        let handle = SoundHandle(self.cursor);
        self.cursor = channel.next;
        self.remaining -= 1;
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn stream(frames: usize) -> SoundStream {
        SoundStream::from_interleaved(vec![0; frames * 2])
    }

    /// Check every structural invariant of the two lists
    fn assert_consistent(pool: &ChannelPool) {
        let mut seen = HashSet::new();

        // Active list: head has no predecessor, links agree both ways
        let mut prev = NIL;
        let mut index = pool.first;
        let mut active = 0;
        while index != NIL {
            assert!(index < pool.channels_count, "active link {} out of range", index);
            assert!(seen.insert(index), "slot {} reached twice", index);
            let channel = &pool.channels[index];
            assert!(channel.active, "slot {} on active list but not active", index);
            assert_eq!(channel.prev, prev, "prev link of slot {} is inconsistent", index);
            prev = index;
            index = channel.next;
            active += 1;
        }
        assert_eq!(active, pool.channels_used);

        // Free list: only `next` matters
        let mut index = pool.first_free;
        let mut free = 0;
        while index != NIL {
            assert!(index < pool.channels_count, "free link {} out of range", index);
            assert!(seen.insert(index), "slot {} reached twice", index);
            assert!(!pool.channels[index].active, "slot {} on free list but active", index);
            index = pool.channels[index].next;
            free += 1;
        }

        assert_eq!(active + free, pool.channels_count);
        assert_eq!(seen.len(), pool.channels_count);
        assert_eq!(pool.free_count(), free);
        assert_eq!(pool.active_handles().count(), active);
    }

    #[test]
    fn test_initialize_builds_free_chain() {
        let pool = ChannelPool::new(4);

        assert!(pool.is_initialized());
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.channels_used(), 0);
        assert_eq!(pool.first, NIL);
        assert_eq!(pool.first_free, 0);
        for i in 0..4 {
            let channel = &pool.channels[i];
            assert_eq!(channel.next, if i < 3 { i + 1 } else { NIL });
            assert_eq!(channel.prev, if i == 0 { NIL } else { i - 1 });
            assert!(channel.stream.is_none());
        }
        assert_consistent(&pool);
    }

    #[test]
    fn test_add_pushes_onto_active_head() {
        let mut pool = ChannelPool::new(4);

        let a = pool.add(stream(8), true, false).unwrap();
        let b = pool.add(stream(8), false, true).unwrap();

        assert_eq!(a, SoundHandle(0));
        assert_eq!(b, SoundHandle(1));
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), vec![b, a]);
        assert!(pool.is_playing(a));
        assert!(!pool.is_playing(b));
        assert!(pool.channel(b).unwrap().is_looping());
        assert_eq!(pool.channel(a).unwrap().sample_count(), 8);
        assert_consistent(&pool);
    }

    #[test]
    fn test_sample_count_is_byte_length_over_four() {
        let mut pool = ChannelPool::new(1);
        // 7 interleaved samples = 14 bytes = 3 frames
        let handle = pool
            .add(SoundStream::from_interleaved(vec![1; 7]), true, false)
            .unwrap();
        assert_eq!(pool.channel(handle).unwrap().sample_count(), 3);
    }

    #[test]
    fn test_full_pool_rejects_add() {
        let mut pool = ChannelPool::new(2);
        pool.add(stream(1), true, false).unwrap();
        pool.add(stream(1), true, false).unwrap();

        let before: Vec<_> = pool.active_handles().collect();
        assert_eq!(pool.add(stream(1), true, false), Err(PoolError::PoolFull));
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), before);
        assert_eq!(pool.channels_used(), 2);
        assert_eq!(pool.first_free, NIL);
        assert_consistent(&pool);
    }

    #[test]
    fn test_zero_capacity_pool_is_always_full() {
        let mut pool = ChannelPool::new(0);
        assert!(pool.is_initialized());
        assert_eq!(pool.add(stream(1), true, false), Err(PoolError::PoolFull));
        assert_consistent(&pool);
    }

    #[test]
    fn test_handles_unique_until_removed() {
        let mut pool = ChannelPool::new(8);
        let mut live = HashSet::new();
        for _ in 0..8 {
            let handle = pool.add(stream(1), true, false).unwrap();
            assert!(live.insert(handle), "handle {} handed out twice", handle);
        }

        // A removed slot is the next one handed out
        let mut victim = SoundHandle(5);
        pool.remove(&mut victim).unwrap();
        let reused = pool.add(stream(1), true, false).unwrap();
        assert_eq!(reused, SoundHandle(5));
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut pool = ChannelPool::new(4);
        let a = pool.add(stream(1), true, false).unwrap();
        let mut b = pool.add(stream(1), true, false).unwrap();
        let mut c = pool.add(stream(1), true, false).unwrap();
        let d = pool.add(stream(1), true, false).unwrap();
        // Active list is d, c, b, a

        pool.remove(&mut b).unwrap();
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), vec![d, c, a]);
        assert_consistent(&pool);

        let mut head = d;
        pool.remove(&mut head).unwrap();
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), vec![c, a]);
        assert_consistent(&pool);

        let mut tail = a;
        pool.remove(&mut tail).unwrap();
        assert_eq!(pool.active_handles().collect::<Vec<_>>(), vec![c]);
        assert_consistent(&pool);

        pool.remove(&mut c).unwrap();
        assert_eq!(pool.active_handles().count(), 0);
        assert_eq!(pool.first, NIL);
        assert_consistent(&pool);
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut pool = ChannelPool::new(2);
        let mut handle = pool.add(stream(4), true, false).unwrap();

        pool.remove(&mut handle).unwrap();
        assert_eq!(handle, SoundHandle::INVALID);

        assert_eq!(pool.play(handle), Err(PoolError::InvalidHandle(handle)));
        assert_eq!(pool.pause(handle), Err(PoolError::InvalidHandle(handle)));
        assert_eq!(pool.restart(handle), Err(PoolError::InvalidHandle(handle)));
        assert_eq!(pool.remove(&mut handle), Err(PoolError::InvalidHandle(handle)));
        assert_consistent(&pool);
    }

    #[test]
    fn test_free_slot_handle_is_rejected() {
        let mut pool = ChannelPool::new(4);
        pool.add(stream(1), true, false).unwrap();

        // Slot 2 is in range but on the free list
        let mut stale = SoundHandle(2);
        assert_eq!(pool.play(stale), Err(PoolError::InvalidHandle(stale)));
        assert_eq!(pool.remove(&mut stale), Err(PoolError::InvalidHandle(SoundHandle(2))));
        assert_eq!(stale, SoundHandle(2));
        assert_eq!(pool.channels_used(), 1);
        assert_consistent(&pool);
    }

    #[test]
    fn test_play_pause_restart() {
        let mut pool = ChannelPool::new(1);
        let handle = pool.add(stream(16), false, false).unwrap();
        pool.channels[handle.0].current_sample = 7;

        pool.play(handle).unwrap();
        assert!(pool.is_playing(handle));
        assert_eq!(pool.position(handle), Some(7));

        pool.pause(handle).unwrap();
        assert!(!pool.is_playing(handle));
        assert_eq!(pool.position(handle), Some(7));

        pool.play(handle).unwrap();
        pool.restart(handle).unwrap();
        assert!(!pool.is_playing(handle));
        assert_eq!(pool.position(handle), Some(0));
        assert!(pool.is_active(handle));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut pool = ChannelPool::new(3);
        let handle = pool.add(stream(1), true, false).unwrap();

        let released = pool.shutdown();
        assert_eq!(released.map(|c| c.len()), Some(3));
        assert!(!pool.is_initialized());
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.channels_used(), 0);

        assert!(pool.shutdown().is_none());
        assert_eq!(pool.play(handle), Err(PoolError::NotInitialized));
        assert_eq!(pool.add(stream(1), true, false), Err(PoolError::NotInitialized));
    }

    #[test]
    fn test_reinitialize_after_shutdown() {
        let mut pool = ChannelPool::uninitialized();
        assert_eq!(pool.add(stream(1), true, false), Err(PoolError::NotInitialized));

        pool.initialize(2);
        pool.add(stream(1), true, false).unwrap();
        pool.shutdown();
        pool.initialize(5);
        assert_eq!(pool.capacity(), 5);
        assert_eq!(pool.channels_used(), 0);
        assert_consistent(&pool);
    }

    #[test]
    fn test_corrupt_free_list_head_is_reported() {
        let mut pool = ChannelPool::new(2);
        pool.first_free = 9;
        assert_eq!(
            pool.add(stream(1), true, false),
            Err(PoolError::FreeListCorrupt { head: 9 })
        );
        assert_eq!(pool.channels_used(), 0);
    }

    #[test]
    fn test_walk_reads_next_before_callback() {
        let mut pool = ChannelPool::new(3);
        for _ in 0..3 {
            pool.add(stream(1), true, false).unwrap();
        }

        let mut visited = 0;
        pool.for_each_active_mut(|channel| {
            channel.playing = false;
            channel.next = NIL;
            visited += 1;
        });
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_randomized_add_remove_keeps_lists_consistent() {
        const CAPACITY: usize = 16;

        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut pool = ChannelPool::new(CAPACITY);
            let mut live: Vec<SoundHandle> = Vec::new();

            for _ in 0..500 {
                let add = live.is_empty() || (live.len() < CAPACITY && rng.gen_bool(0.55));
                if add {
                    let handle = pool.add(stream(rng.gen_range(0..8)), rng.gen(), rng.gen()).unwrap();
                    assert!(!live.contains(&handle), "seed {}: duplicate handle {}", seed, handle);
                    live.push(handle);
                } else {
                    let mut handle = live.swap_remove(rng.gen_range(0..live.len()));
                    pool.remove(&mut handle).unwrap();
                    assert_eq!(handle, SoundHandle::INVALID);
                }
                assert_consistent(&pool);
                assert_eq!(pool.channels_used(), live.len());
            }
        }
    }
}
