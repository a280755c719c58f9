//! Audio-thread side of the mixer: owns the live pool

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::pool::ChannelPool;
use crate::types::StereoFrame;

use super::atomics::MixerAtomics;
use super::command::{MixerCommand, Retired};
use super::mixer::{render, MixReport};

/// The mixer as seen by the audio callback
///
/// Owns the live [`ChannelPool`] exclusively. Each call to
/// [`MixerEngine::process`] first applies every queued command, then renders
/// one quantum. Nothing here allocates, frees, blocks or logs.
pub struct MixerEngine {
    /// Boxed so Initialize can swap pools without moving storage
    pool: Box<ChannelPool>,
    command_rx: rtrb::Consumer<MixerCommand>,
    retire_tx: rtrb::Producer<Retired>,
    atomics: Arc<MixerAtomics>,
}

impl MixerEngine {
    pub(crate) fn new(
        pool: Box<ChannelPool>,
        command_rx: rtrb::Consumer<MixerCommand>,
        retire_tx: rtrb::Producer<Retired>,
        atomics: Arc<MixerAtomics>,
    ) -> Self {
        Self {
            pool,
            command_rx,
            retire_tx,
            atomics,
        }
    }

    /// Read-only view of the live pool
    pub fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    pub fn atomics(&self) -> Arc<MixerAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Apply all pending commands from the control thread
    pub fn process_commands(&mut self) {
        while let Ok(command) = self.command_rx.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: MixerCommand) {
        let result = match command {
            MixerCommand::Add {
                handle,
                stream,
                playing,
                looping,
            } => self
                .pool
                .add(stream, playing, looping)
                .map(|assigned| debug_assert_eq!(assigned, handle, "shadow pool diverged")),
            MixerCommand::Remove { mut handle } => self.pool.remove(&mut handle),
            MixerCommand::Play { handle } => self.pool.play(handle),
            MixerCommand::Pause { handle } => self.pool.pause(handle),
            MixerCommand::Restart { handle } => self.pool.restart(handle),
            MixerCommand::Initialize(mut pool) => {
                std::mem::swap(&mut self.pool, &mut pool);
                self.retire(Retired::Pool(pool));
                Ok(())
            }
            MixerCommand::Shutdown => {
                if let Some(channels) = self.pool.shutdown() {
                    self.retire(Retired::Channels(channels));
                }
                Ok(())
            }
        };

        if result.is_err() {
            self.atomics.rejected_commands.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Hand storage back to the control thread
    ///
    /// If the return queue is full the storage is dropped here, freeing it on
    /// the audio thread, and `retire_overflows` is bumped. The controller
    /// drains the queue before every command, so this needs it to stop
    /// calling in.
    fn retire(&mut self, retired: Retired) {
        if self.retire_tx.push(retired).is_err() {
            self.atomics.retire_overflows.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Render one quantum into `out` after applying pending commands
    ///
    /// Every frame of `out` is written.
    pub fn process(&mut self, out: &mut [StereoFrame]) -> MixReport {
        self.process_commands();

        let report = render(&mut self.pool, out.len(), out);

        self.atomics
            .channels_used
            .store(self.pool.channels_used(), Ordering::Relaxed);
        self.atomics
            .channels_playing
            .store(self.pool.channels_playing(), Ordering::Relaxed);
        if report.clipped {
            self.atomics.clip_active.store(true, Ordering::Relaxed);
        }
        self.atomics.quanta_rendered.fetch_add(1, Ordering::Relaxed);

        report
    }
}
