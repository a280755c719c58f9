//! Fixed-capacity channel pool
//!
//! A contiguous array of channel slots threaded onto two intrusive lists by
//! index: the active list (doubly linked, traversed by the mixer every
//! render quantum) and the free list (singly linked, source of handles).
//! Every slot belongs to exactly one of the two lists at all times, and no
//! allocation happens after initialization.

mod channel;
mod error;
mod pool;

pub use channel::Channel;
pub use error::{PoolError, PoolResult};
pub use pool::{ActiveHandles, ChannelPool};

pub(crate) use channel::NIL;
