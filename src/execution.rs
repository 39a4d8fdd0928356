//! Runs blocking codec operations on the worker pool
//!
//! Reads and writes report failure differently, on purpose:
//!
//! - [`Executor::execute_read`] returns a [`PendingRead`] that always resolves
//!   to an [`Outcome`]. A missing file, a codec error or a crashed worker all
//!   end up as `Outcome::Failure`.
//! - [`Executor::execute_write`] returns a [`PendingWrite`] that resolves to
//!   `Result<(), FileError>`. A failed write is a failed task, and callers
//!   decide whether to propagate it or let a batch policy capture it.
//!
//! Both handles are eager: the work is already submitted when the handle is
//! returned.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use crate::error::{BoxError, FileError};
use crate::observability::{NoopObserver, OperationEvent, OperationKind, OperationObserver, notify};
use crate::outcome::Outcome;
use crate::pool::WorkerPool;

#[derive(Clone)]
pub struct Executor {
    pool: WorkerPool,
    observer: Arc<dyn OperationObserver>,
}

impl Executor {
    pub fn new(pool: WorkerPool) -> Self {
        Self::with_observer(pool, Arc::new(NoopObserver))
    }

    pub fn with_observer(pool: WorkerPool, observer: Arc<dyn OperationObserver>) -> Self {
        Self { pool, observer }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Submit a read; the file must exist before `op` is invoked
    pub fn execute_read<T, F>(&self, path: &Path, format: &'static str, op: F) -> PendingRead<T>
    where
        F: FnOnce(&Path) -> Result<T, BoxError> + Send + 'static,
        T: Send + 'static,
    {
        info!(file = %path.display(), format, "Starting asynchronous file read");

        let observer = Arc::clone(&self.observer);
        let owned = path.to_path_buf();
        let handle = self
            .pool
            .submit(move || run_read(&owned, format, observer.as_ref(), op));

        PendingRead {
            handle,
            path: path.to_path_buf(),
            format,
        }
    }

    /// Submit a write; `content` names what is written, for logs only
    pub fn execute_write<F>(
        &self,
        path: &Path,
        format: &'static str,
        content: &'static str,
        op: F,
    ) -> PendingWrite
    where
        F: FnOnce(&Path) -> Result<(), BoxError> + Send + 'static,
    {
        info!(file = %path.display(), format, content, "Starting asynchronous file write");

        let observer = Arc::clone(&self.observer);
        let owned = path.to_path_buf();
        let handle = self
            .pool
            .submit(move || run_write(&owned, format, content, observer.as_ref(), op));

        PendingWrite {
            handle,
            path: path.to_path_buf(),
            format,
        }
    }
}

fn run_read<T, F>(
    path: &Path,
    format: &'static str,
    observer: &dyn OperationObserver,
    op: F,
) -> Outcome<T>
where
    F: FnOnce(&Path) -> Result<T, BoxError>,
{
    let event = OperationEvent {
        kind: OperationKind::Read,
        format,
        path,
    };
    notify(|| observer.on_start(&event));
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("unnamed");

    if !path.exists() {
        let err = FileError::FileMissing {
            format,
            path: path.to_path_buf(),
        };
        error!(thread = thread_name, format, file = %path.display(), "File not found");
        notify(|| observer.on_failure(&event, &err));
        return Outcome::failure(err);
    }

    debug!(thread = thread_name, format, file = %path.display(), "Reading file");
    match op(path) {
        Ok(value) => {
            info!(thread = thread_name, format, file = %path.display(), "Finished reading file");
            notify(|| observer.on_success(&event));
            Outcome::success(value)
        }
        Err(source) => {
            error!(
                thread = thread_name,
                format,
                file = %path.display(),
                error = %source,
                "Error reading file"
            );
            let err = FileError::Decode {
                format,
                path: path.to_path_buf(),
                source,
            };
            notify(|| observer.on_failure(&event, &err));
            Outcome::failure(err)
        }
    }
}

fn run_write<F>(
    path: &Path,
    format: &'static str,
    content: &'static str,
    observer: &dyn OperationObserver,
    op: F,
) -> Result<(), FileError>
where
    F: FnOnce(&Path) -> Result<(), BoxError>,
{
    let event = OperationEvent {
        kind: OperationKind::Write,
        format,
        path,
    };
    notify(|| observer.on_start(&event));
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("unnamed");

    debug!(thread = thread_name, format, content, file = %path.display(), "Writing file");
    match op(path) {
        Ok(()) => {
            info!(thread = thread_name, format, content, file = %path.display(), "Finished writing file");
            notify(|| observer.on_success(&event));
            Ok(())
        }
        Err(source) => {
            error!(
                thread = thread_name,
                format,
                content,
                file = %path.display(),
                error = %source,
                "Error writing file"
            );
            let err = FileError::Encode {
                format,
                path: path.to_path_buf(),
                source,
            };
            notify(|| observer.on_failure(&event, &err));
            Err(err)
        }
    }
}

/// Handle to a submitted read; resolves to an [`Outcome`], never an error
#[derive(Debug)]
pub struct PendingRead<T> {
    handle: JoinHandle<Result<Outcome<T>, JoinError>>,
    path: PathBuf,
    format: &'static str,
}

impl<T> PendingRead<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &'static str {
        self.format
    }
}

impl<T> Future for PendingRead<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let joined = match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(joined) => joined.and_then(|inner| inner),
        };
        match joined {
            Ok(outcome) => {
                log_completion(this.format, &this.path, OperationKind::Read, outcome.error());
                Poll::Ready(outcome)
            }
            Err(join_err) => {
                let err = task_failed(this.format, &this.path, &join_err);
                log_completion(this.format, &this.path, OperationKind::Read, Some(&err));
                Poll::Ready(Outcome::failure(err))
            }
        }
    }
}

/// Handle to a submitted write; a failed write resolves to `Err`
#[derive(Debug)]
pub struct PendingWrite {
    handle: JoinHandle<Result<Result<(), FileError>, JoinError>>,
    path: PathBuf,
    format: &'static str,
}

impl PendingWrite {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &'static str {
        self.format
    }
}

impl Future for PendingWrite {
    type Output = Result<(), FileError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(joined) => match joined.and_then(|inner| inner) {
                Ok(result) => result,
                Err(join_err) => Err(task_failed(this.format, &this.path, &join_err)),
            },
        };
        log_completion(this.format, &this.path, OperationKind::Write, result.as_ref().err());
        Poll::Ready(result)
    }
}

fn task_failed(format: &'static str, path: &Path, join_err: &JoinError) -> FileError {
    FileError::TaskFailed {
        format,
        path: path.to_path_buf(),
        reason: join_err.to_string(),
    }
}

fn log_completion<E: std::fmt::Display + ?Sized>(
    format: &'static str,
    path: &Path,
    kind: OperationKind,
    error: Option<&E>,
) {
    match error {
        None => info!(format, action = kind.as_str(), file = %path.display(), "Operation completed successfully"),
        Some(err) => tracing::warn!(
            format,
            action = kind.as_str(),
            file = %path.display(),
            error = %err,
            "Operation completed with failure"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::Metrics;
    use std::error::Error as _;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn executor() -> Executor {
        Executor::new(WorkerPool::current(4).unwrap())
    }

    #[tokio::test]
    async fn test_read_success() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let outcome = executor()
            .execute_read(&path, "TXT", |p| Ok(std::fs::read_to_string(p)?))
            .await;

        assert_eq!(outcome.into_value().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_missing_file_skips_operation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);

        let outcome: Outcome<String> = executor()
            .execute_read(&path, "JSON", move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(String::new())
            })
            .await;

        assert!(!invoked.load(Ordering::SeqCst));
        assert!(matches!(
            outcome.error().map(|e| e.as_ref()),
            Some(FileError::FileMissing { format: "JSON", .. })
        ));
    }

    #[tokio::test]
    async fn test_operation_error_becomes_decode_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("b.json");
        std::fs::write(&path, "{").unwrap();

        let outcome: Outcome<()> = executor()
            .execute_read(&path, "JSON", |_| Err("unexpected end of input".into()))
            .await;

        let err = outcome.into_error().unwrap();
        assert!(matches!(err.as_ref(), FileError::Decode { .. }));
        assert_eq!(err.to_string(), "failed to read JSON file: b.json");
        assert_eq!(err.source().unwrap().to_string(), "unexpected end of input");
    }

    #[tokio::test]
    async fn test_panicking_operation_becomes_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c.txt");
        std::fs::write(&path, "x").unwrap();

        let outcome: Outcome<String> = executor()
            .execute_read(&path, "TXT", |_| panic!("codec crashed"))
            .await;

        assert!(matches!(
            outcome.error().map(|e| e.as_ref()),
            Some(FileError::TaskFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_is_task_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("out.txt");

        let result = executor()
            .execute_write(&path, "TXT", "String", |p| Ok(std::fs::write(p, "data")?))
            .await;

        assert!(matches!(result, Err(FileError::Encode { format: "TXT", .. })));
    }

    #[tokio::test]
    async fn test_write_success() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");

        executor()
            .execute_write(&path, "TXT", "String", |p| Ok(std::fs::write(p, "data")?))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
    }

    struct PanickingObserver;

    impl OperationObserver for PanickingObserver {
        fn on_start(&self, _event: &OperationEvent<'_>) {
            panic!("observer failure");
        }
    }

    #[tokio::test]
    async fn test_observer_panic_does_not_alter_outcome() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.txt");
        std::fs::write(&path, "ok").unwrap();
        let executor = Executor::with_observer(
            WorkerPool::current(4).unwrap(),
            Arc::new(PanickingObserver),
        );

        let outcome = executor
            .execute_read(&path, "TXT", |p| Ok(std::fs::read_to_string(p)?))
            .await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_metrics_observer_counts() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("a.txt");
        std::fs::write(&present, "ok").unwrap();
        let metrics = Arc::new(Metrics::new());
        let executor = Executor::with_observer(WorkerPool::current(4).unwrap(), metrics.clone());

        let _ = executor
            .execute_read(&present, "TXT", |p| Ok(std::fs::read_to_string(p)?))
            .await;
        let _ = executor
            .execute_read(&temp_dir.path().join("gone.txt"), "TXT", |p| {
                Ok(std::fs::read_to_string(p)?)
            })
            .await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reads_started, 2);
        assert_eq!(snapshot.reads_succeeded, 1);
        assert_eq!(snapshot.reads_failed, 1);
    }
}
