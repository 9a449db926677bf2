//! Defines the `Worker` trait; abstracting over worker-specific
//! functionality so a coordinating thread can start, watch, and clean up
//! long-running components of the indexer

use std::fmt::Debug;
use std::thread::JoinHandle;

use async_trait::async_trait;

/// The Worker trait abstracts over worker functionality with a series of
/// callbacks that allow a worker to be started, joined, and cleaned up
#[async_trait]
pub trait Worker {
    /// The configuration needed to spawn the implementing worker
    type WorkerConfig;
    /// The error type that results from an invalid startup or cleanup
    type Error: 'static + Send + Debug;

    /// Create a new instance of the implementing worker
    async fn new(config: Self::WorkerConfig) -> Result<Self, Self::Error>
    where
        Self: Sized;

    /// Called to begin a worker's execution
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Returns a name by which the worker can be identified
    fn name(&self) -> String;

    /// Called to join the calling thread's execution to the execution of the
    /// worker
    fn join(&mut self) -> JoinHandle<Self::Error>;

    /// Returns whether or not the implementing type is recoverable
    fn is_recoverable(&self) -> bool;

    /// Called to cleanup the resources a worker owns when the worker exits
    fn cleanup(&mut self) -> Result<(), Self::Error>;
}
