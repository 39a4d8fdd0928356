//! Worker pool used to run blocking file I/O
//!
//! [`WorkerPool`] is a cheap, cloneable submit handle over a Tokio runtime
//! that bounds how many file operations run at once. It never owns the
//! runtime: either borrow the ambient one with [`WorkerPool::current`] or
//! build one with [`ManagedPool`], whose shutdown is the caller's job.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::error::FileError;

#[derive(Clone, Debug)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Wrap a runtime handle, allowing at most `max_concurrent` operations at once
    pub fn new(handle: Handle, max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Pool over the runtime the caller is currently running in
    ///
    /// Returns `None` outside a Tokio runtime.
    pub fn current(max_concurrent: usize) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|handle| Self::new(handle, max_concurrent))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Submit a blocking operation; the returned handle resolves with its value
    ///
    /// A panic inside `op`, or cancellation of the blocking task, surfaces as
    /// the inner [`JoinError`].
    pub fn submit<F, T>(&self, op: F) -> JoinHandle<Result<T, JoinError>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = self.handle.clone();

        self.handle.spawn(async move {
            // The semaphore is never closed, so acquiring only waits.
            let permit = permits.acquire_owned().await.ok();
            handle
                .spawn_blocking(move || {
                    let _permit = permit;
                    op()
                })
                .await
        })
    }

    /// Spawn an async task (used for non-blocking aggregation)
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Block the calling thread until `future` completes
    ///
    /// Refuses to run from inside a runtime, where blocking would stall a
    /// worker thread.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, FileError> {
        if Handle::try_current().is_ok() {
            return Err(FileError::BlockingInAsyncContext);
        }
        Ok(self.handle.block_on(future))
    }
}

/// A worker pool that owns its runtime
pub struct ManagedPool {
    runtime: Runtime,
    pool: WorkerPool,
}

impl ManagedPool {
    pub fn new(config: &PoolConfig) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .max_blocking_threads(config.max_blocking_threads.max(1))
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()?;

        let pool = WorkerPool::new(runtime.handle().clone(), config.max_concurrent_operations);

        info!(
            worker_threads = config.worker_threads,
            max_blocking_threads = config.max_blocking_threads,
            max_concurrent_operations = pool.capacity(),
            "Worker pool started"
        );

        Ok(Self { runtime, pool })
    }

    pub fn pool(&self) -> WorkerPool {
        self.pool.clone()
    }

    /// Shut the runtime down, waiting up to `timeout` for running operations
    ///
    /// Must be called from outside any async context.
    pub fn shutdown(self, timeout: Duration) {
        debug!(?timeout, "Shutting down worker pool");
        self.runtime.shutdown_timeout(timeout);
        info!("Worker pool stopped");
    }
}
