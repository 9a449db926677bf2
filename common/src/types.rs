//! Defines common types that many crates can depend on

pub mod events;
pub mod record;

use tokio::sync::watch::{
    channel as watch_channel, Receiver as WatchReceiver, Sender as WatchSender,
};

/// A type alias for a block number on the indexed chain
pub type BlockNumber = u64;

/// A type alias for an empty channel used to signal cancellation to workers
pub type CancelChannel = WatchReceiver<()>;

/// Create a new cancel channel; the sender side is held by the coordinator
/// and the receiver side is given to a worker
pub fn new_cancel_channel() -> (WatchSender<()>, CancelChannel) {
    watch_channel(())
}
