//! Concurrent multi-file reads and writes
//!
//! Every member of a batch is submitted before any is awaited, and the batch
//! always waits for all of them. The tolerance flag decides what a failed
//! member does to the batch:
//!
//! - `true`: the failure becomes a `Failure` entry; the batch returns `Ok`
//!   with exactly one entry per key.
//! - `false`: the batch returns [`FileError::BatchAggregate`] naming every
//!   failed key, and no successful sibling is exposed.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{FileError, Result};
use crate::execution::{PendingRead, PendingWrite};
use crate::handlers::{Content, TargetType, WriteOption};
use crate::manager::FileManager;
use crate::outcome::Outcome;

/// Per-key outcomes of a batch read
pub type BatchOutcomes<T> = HashMap<String, Outcome<T>>;

impl FileManager {
    /// Read every request, blocking the calling thread until all finish
    ///
    /// Must be called from outside an async runtime; inside one this returns
    /// [`FileError::BlockingInAsyncContext`] without submitting anything.
    pub fn read_many_blocking(
        &self,
        requests: HashMap<String, TargetType>,
        tolerate: bool,
    ) -> Result<BatchOutcomes<Content>> {
        self.pool()
            .block_on(self.collect_reads(requests, tolerate))?
    }

    /// Read every request without blocking; the aggregation runs on the pool
    pub fn read_many(
        &self,
        requests: HashMap<String, TargetType>,
        tolerate: bool,
    ) -> PendingBatch<BatchOutcomes<Content>> {
        let manager = self.clone();
        let handle = self
            .pool()
            .spawn(async move { manager.collect_reads(requests, tolerate).await });
        PendingBatch { handle }
    }

    /// Read structured files and convert each into `T`
    pub async fn read_many_as<T, I, P>(&self, paths: I, tolerate: bool) -> Result<BatchOutcomes<T>>
    where
        T: DeserializeOwned + Send + 'static,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let batch_id = Uuid::now_v7();
        let submissions: Vec<_> = paths
            .into_iter()
            .map(Into::into)
            .map(|key: String| {
                let pending = self.read_object::<T>(&key);
                (key, pending)
            })
            .collect();
        info!(
            %batch_id,
            files = submissions.len(),
            target = %TargetType::object_of::<T>(),
            tolerate,
            "Starting batch read"
        );
        gather(batch_id, submissions, tolerate).await
    }

    /// Write every entry with the shared option, blocking until all finish
    ///
    /// Returns `Ok(true)` when every write succeeded.
    pub fn write_many(&self, contents: HashMap<String, Content>, option: WriteOption) -> Result<bool> {
        self.pool()
            .block_on(self.collect_writes(contents, option))?
    }

    /// Non-blocking form of [`write_many`](Self::write_many)
    pub fn write_many_async(
        &self,
        contents: HashMap<String, Content>,
        option: WriteOption,
    ) -> PendingBatch<bool> {
        let manager = self.clone();
        let handle = self
            .pool()
            .spawn(async move { manager.collect_writes(contents, option).await });
        PendingBatch { handle }
    }

    async fn collect_reads(
        &self,
        requests: HashMap<String, TargetType>,
        tolerate: bool,
    ) -> Result<BatchOutcomes<Content>> {
        let batch_id = Uuid::now_v7();
        info!(%batch_id, files = requests.len(), tolerate, "Starting batch read");

        let submissions: Vec<_> = requests
            .into_iter()
            .map(|(key, target)| {
                let pending = self.read(&key, &target);
                (key, pending)
            })
            .collect();
        gather(batch_id, submissions, tolerate).await
    }

    async fn collect_writes(&self, contents: HashMap<String, Content>, option: WriteOption) -> Result<bool> {
        let batch_id = Uuid::now_v7();
        info!(%batch_id, files = contents.len(), ?option, "Starting batch write");

        // Nothing is submitted unless every entry has a usable option
        let mut resolved = Vec::with_capacity(contents.len());
        for (key, content) in contents {
            let entry_option = self.registry().resolve_write_option(Path::new(&key), option)?;
            resolved.push((key, content, entry_option));
        }

        let mut failures = Vec::new();
        let mut pending: Vec<(String, PendingWrite)> = Vec::with_capacity(resolved.len());
        for (key, content, entry_option) in resolved {
            match self.submit_write(Path::new(&key), content, entry_option) {
                Ok(handle) => pending.push((key, handle)),
                Err(err) => {
                    warn!(%batch_id, file = %key, error = %err, "Batch write rejected before submission");
                    failures.push((key, Arc::new(err)));
                }
            }
        }

        for (key, handle) in pending {
            if let Err(err) = handle.await {
                failures.push((key, Arc::new(err)));
            }
        }

        if failures.is_empty() {
            info!(%batch_id, "Batch write completed");
            return Ok(true);
        }

        failures.sort_by(|a, b| a.0.cmp(&b.0));
        error!(%batch_id, failed = failures.len(), "Batch write failed");
        Err(FileError::BatchAggregate { failures })
    }
}

async fn gather<T>(
    batch_id: Uuid,
    submissions: Vec<(String, Result<PendingRead<T>>)>,
    tolerate: bool,
) -> Result<BatchOutcomes<T>> {
    let mut outcomes = HashMap::with_capacity(submissions.len());
    let mut pending = Vec::with_capacity(submissions.len());

    for (key, submission) in submissions {
        match submission {
            Ok(handle) => pending.push((key, handle)),
            Err(err) => {
                warn!(%batch_id, file = %key, error = %err, "Batch read rejected before submission");
                outcomes.insert(key, Outcome::failure(err));
            }
        }
    }

    for (key, handle) in pending {
        let outcome = handle.await;
        outcomes.insert(key, outcome);
    }

    let failed = outcomes.values().filter(|o| o.is_failure()).count();
    info!(%batch_id, files = outcomes.len(), failed, "Batch read completed");

    if tolerate || failed == 0 {
        return Ok(outcomes);
    }

    let mut failures: Vec<(String, Arc<FileError>)> = outcomes
        .iter()
        .filter_map(|(key, outcome)| outcome.error().map(|err| (key.clone(), Arc::clone(err))))
        .collect();
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    error!(%batch_id, failed, "Batch read failed");
    Err(FileError::BatchAggregate { failures })
}

/// Handle to a batch aggregating on the pool
pub struct PendingBatch<R> {
    handle: JoinHandle<Result<R>>,
}

impl<R> Future for PendingBatch<R> {
    type Output = Result<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_err)) => Poll::Ready(Err(FileError::TaskFailed {
                format: "BATCH",
                path: PathBuf::new(),
                reason: join_err.to_string(),
            })),
        }
    }
}
