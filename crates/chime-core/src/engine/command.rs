//! Lock-free command queue from the control thread to the audio thread
//!
//! The control thread never touches the live pool. It pushes small
//! [`MixerCommand`] values into an `rtrb` single-producer single-consumer
//! ring buffer, and the audio callback drains and applies them at the start
//! of each render quantum, so the callback is the only thread that mutates
//! the active and free lists.
//!
//! A second ring buffer runs the other way and carries storage the audio
//! thread has finished with ([`Retired`]), so it is freed on the control
//! thread instead of inside the callback.
//!
//! ```ignore
//! let (controller, engine) = mixer_channel(32);
//! // control thread
//! let handle = controller.add(stream, true, false)?;
//! // audio thread, once per quantum
//! engine.process(&mut frames);
//! ```

use thiserror::Error;

use crate::pool::{Channel, ChannelPool, PoolError};
use crate::types::{SoundHandle, SoundStream};

/// Commands sent from the control thread to the audio thread
///
/// Every variant has already been validated against the controller's
/// shadow pool, so applying it to the live pool is expected to succeed.
pub enum MixerCommand {
    /// Assign a stream to the head of the free list
    ///
    /// `handle` is the slot the shadow pool assigned; the live pool pops the
    /// same slot because both pools have seen the same operations.
    Add {
        handle: SoundHandle,
        stream: SoundStream,
        playing: bool,
        looping: bool,
    },
    Remove { handle: SoundHandle },
    Play { handle: SoundHandle },
    Pause { handle: SoundHandle },
    /// Stop and rewind
    Restart { handle: SoundHandle },
    /// Replace the live pool with a freshly allocated one
    ///
    /// Boxed so the allocation happens on the control thread and the
    /// command stays pointer-sized.
    Initialize(Box<ChannelPool>),
    /// Release the live pool's channels
    Shutdown,
}

/// Storage handed back from the audio thread for deallocation
pub enum Retired {
    /// Pool replaced by [`MixerCommand::Initialize`]
    Pool(Box<ChannelPool>),
    /// Channels released by [`MixerCommand::Shutdown`]
    Channels(Box<[Channel]>),
}

/// Errors from queued control operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The operation was rejected by the pool
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The command queue has no free slot; nothing was changed
    #[error("Mixer command queue full")]
    QueueFull,
}

/// Default capacity of the command queue
///
/// Gameplay code can fire a burst of sound effects in a single frame; 256
/// commands leave plenty of headroom for that between two render quanta.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// Returns `(Producer, Consumer)` where the producer is owned by the
/// control thread and the consumer by the audio thread.
pub fn command_channel(
    capacity: usize,
) -> (rtrb::Producer<MixerCommand>, rtrb::Consumer<MixerCommand>) {
    rtrb::RingBuffer::new(capacity.max(1))
}

/// Create the return channel for retired storage
///
/// Sized like the command queue: each command retires at most one item and
/// the controller drains this queue before every push.
pub fn retire_channel(capacity: usize) -> (rtrb::Producer<Retired>, rtrb::Consumer<Retired>) {
    rtrb::RingBuffer::new(capacity.max(1))
}
