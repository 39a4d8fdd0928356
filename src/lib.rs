pub mod batch;
pub mod config;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod manager;
pub mod observability;
pub mod outcome;
pub mod pool;

pub use batch::{BatchOutcomes, PendingBatch};
pub use error::{FileError, Result};
pub use execution::{Executor, PendingRead, PendingWrite};
pub use manager::FileManager;
pub use outcome::Outcome;
pub use pool::{ManagedPool, WorkerPool};
