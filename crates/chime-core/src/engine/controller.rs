//! Control-thread side of the mixer

use std::sync::Arc;

use crate::pool::{ChannelPool, PoolError};
use crate::types::{SoundHandle, SoundStream};

use super::atomics::MixerAtomics;
use super::command::{
    command_channel, retire_channel, CommandError, MixerCommand, Retired, COMMAND_QUEUE_CAPACITY,
};
use super::engine::MixerEngine;

/// Create a connected controller/engine pair around a pool of `capacity` channels
///
/// The controller stays on the control (game/update) thread; the engine is
/// moved into the audio callback.
pub fn mixer_channel(capacity: usize) -> (SoundController, MixerEngine) {
    mixer_channel_with_queue(capacity, COMMAND_QUEUE_CAPACITY)
}

/// Like [`mixer_channel`] with an explicit command queue capacity
pub fn mixer_channel_with_queue(
    capacity: usize,
    queue_capacity: usize,
) -> (SoundController, MixerEngine) {
    let (command_tx, command_rx) = command_channel(queue_capacity);
    let (retire_tx, retire_rx) = retire_channel(queue_capacity);
    let atomics = Arc::new(MixerAtomics::new());

    let engine = MixerEngine::new(
        Box::new(ChannelPool::new(capacity)),
        command_rx,
        retire_tx,
        Arc::clone(&atomics),
    );
    let controller = SoundController {
        shadow: ChannelPool::new(capacity),
        command_tx,
        retire_rx,
        atomics,
    };

    log::debug!(
        "Mixer channel created: {} channels, queue capacity {}",
        capacity,
        queue_capacity
    );

    (controller, engine)
}

/// Control interface to a running mixer
///
/// Operations mirror [`ChannelPool`], but instead of touching the live pool
/// they are applied to a shadow copy and then queued for the audio thread.
/// The shadow sees exactly the same sequence of list operations as the live
/// pool, so the handle returned by [`SoundController::add`] is the one the
/// engine will assign, and every error is reported here, synchronously,
/// before anything is queued.
///
/// Playback flags in the shadow are not kept in sync with the audio thread
/// (a one-shot sound stops by itself there); use [`MixerAtomics`] for live
/// status.
pub struct SoundController {
    shadow: ChannelPool,
    command_tx: rtrb::Producer<MixerCommand>,
    retire_rx: rtrb::Consumer<Retired>,
    atomics: Arc<MixerAtomics>,
}

impl SoundController {
    /// Replace the mixer's pool with a new one of `capacity` channels
    ///
    /// Any active channels are dropped.
    pub fn initialize(&mut self, capacity: usize) -> Result<(), CommandError> {
        self.ensure_space()?;
        self.shadow.initialize(capacity);
        self.send(MixerCommand::Initialize(Box::new(ChannelPool::new(capacity))))?;
        log::info!("Sound pool initialized with {} channels", capacity);
        Ok(())
    }

    /// Release the mixer's channels; the mixer renders silence afterwards
    ///
    /// A no-op if the pool is already shut down.
    pub fn shutdown(&mut self) -> Result<(), CommandError> {
        if !self.shadow.is_initialized() {
            return Ok(());
        }
        self.ensure_space()?;
        self.shadow.shutdown();
        self.send(MixerCommand::Shutdown)?;
        log::info!("Sound pool shut down");
        Ok(())
    }

    /// Assign `stream` to a free channel
    pub fn add(
        &mut self,
        stream: SoundStream,
        playing: bool,
        looping: bool,
    ) -> Result<SoundHandle, CommandError> {
        self.ensure_space()?;
        let handle = self
            .shadow
            .add(stream.clone(), playing, looping)
            .map_err(|e| self.report(e))?;
        self.send(MixerCommand::Add {
            handle,
            stream,
            playing,
            looping,
        })?;
        log::debug!("Sound {} added (playing: {}, looping: {})", handle, playing, looping);
        Ok(handle)
    }

    /// Free the channel; `handle` is set to [`SoundHandle::INVALID`] on success
    pub fn remove(&mut self, handle: &mut SoundHandle) -> Result<(), CommandError> {
        self.ensure_space()?;
        let target = *handle;
        self.shadow.remove(handle).map_err(|e| self.report(e))?;
        self.send(MixerCommand::Remove { handle: target })?;
        log::debug!("Sound {} removed", target);
        Ok(())
    }

    pub fn play(&mut self, handle: SoundHandle) -> Result<(), CommandError> {
        self.ensure_space()?;
        self.shadow.play(handle).map_err(|e| self.report(e))?;
        self.send(MixerCommand::Play { handle })
    }

    pub fn pause(&mut self, handle: SoundHandle) -> Result<(), CommandError> {
        self.ensure_space()?;
        self.shadow.pause(handle).map_err(|e| self.report(e))?;
        self.send(MixerCommand::Pause { handle })
    }

    /// Stop the channel and rewind it; call [`SoundController::play`] to resume
    pub fn restart(&mut self, handle: SoundHandle) -> Result<(), CommandError> {
        self.ensure_space()?;
        self.shadow.restart(handle).map_err(|e| self.report(e))?;
        self.send(MixerCommand::Restart { handle })
    }

    /// Whether `handle` addresses a channel that has not been removed
    pub fn is_active(&self, handle: SoundHandle) -> bool {
        self.shadow.is_active(handle)
    }

    pub fn is_initialized(&self) -> bool {
        self.shadow.is_initialized()
    }

    pub fn capacity(&self) -> usize {
        self.shadow.capacity()
    }

    /// Channels allocated from the control thread's point of view
    pub fn channels_used(&self) -> usize {
        self.shadow.channels_used()
    }

    /// Live status published by the audio thread
    pub fn atomics(&self) -> Arc<MixerAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Commands queued but not yet applied by the audio thread
    pub fn pending_commands(&self) -> usize {
        self.command_tx.buffer().capacity() - self.command_tx.slots()
    }

    /// Drop storage the audio thread has handed back
    ///
    /// Called automatically before every control operation. Returns the
    /// number of items freed.
    pub fn reclaim(&mut self) -> usize {
        let mut freed = 0;
        while let Ok(retired) = self.retire_rx.pop() {
            drop(retired);
            freed += 1;
        }
        if freed > 0 {
            log::trace!("Reclaimed {} retired pool allocations", freed);
        }
        freed
    }

    /// Make sure the next push cannot fail, before the shadow is touched
    fn ensure_space(&mut self) -> Result<(), CommandError> {
        self.reclaim();
        if self.command_tx.slots() == 0 {
            log::warn!("Mixer command queue full");
            return Err(CommandError::QueueFull);
        }
        Ok(())
    }

    fn send(&mut self, command: MixerCommand) -> Result<(), CommandError> {
        self.command_tx
            .push(command)
            .map_err(|_| CommandError::QueueFull)
    }

    fn report(&self, error: PoolError) -> CommandError {
        log::warn!("Sound operation rejected: {}", error);
        CommandError::Pool(error)
    }
}
