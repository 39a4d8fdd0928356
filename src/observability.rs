//! Operation hooks and counters

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Write,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "reading",
            OperationKind::Write => "writing",
        }
    }
}

/// What an observer is told about a single file operation
#[derive(Debug, Clone, Copy)]
pub struct OperationEvent<'a> {
    pub kind: OperationKind,
    pub format: &'static str,
    pub path: &'a Path,
}

/// Best-effort hooks around every file operation
///
/// Hooks run on the worker thread. They must not block for long; a panic
/// inside a hook is contained and never changes the operation's result.
pub trait OperationObserver: Send + Sync {
    fn on_start(&self, _event: &OperationEvent<'_>) {}

    fn on_success(&self, _event: &OperationEvent<'_>) {}

    fn on_failure(&self, _event: &OperationEvent<'_>, _error: &FileError) {}
}

/// Observer that does nothing
#[derive(Debug, Default)]
pub struct NoopObserver;

impl OperationObserver for NoopObserver {}

/// Run a hook, swallowing any panic it raises
pub(crate) fn notify(hook: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(hook)).is_err() {
        tracing::warn!("Operation observer panicked; ignoring");
    }
}

/// Metrics handle recording operation counters
#[derive(Debug, Default)]
pub struct Metrics {
    reads_started: AtomicU64,
    reads_succeeded: AtomicU64,
    reads_failed: AtomicU64,
    writes_started: AtomicU64,
    writes_succeeded: AtomicU64,
    writes_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reads_started: self.reads_started.load(Ordering::Relaxed),
            reads_succeeded: self.reads_succeeded.load(Ordering::Relaxed),
            reads_failed: self.reads_failed.load(Ordering::Relaxed),
            writes_started: self.writes_started.load(Ordering::Relaxed),
            writes_succeeded: self.writes_succeeded.load(Ordering::Relaxed),
            writes_failed: self.writes_failed.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64, name: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = name, "Metric incremented");
    }
}

impl OperationObserver for Metrics {
    fn on_start(&self, event: &OperationEvent<'_>) {
        match event.kind {
            OperationKind::Read => Self::bump(&self.reads_started, "reads_started"),
            OperationKind::Write => Self::bump(&self.writes_started, "writes_started"),
        }
    }

    fn on_success(&self, event: &OperationEvent<'_>) {
        match event.kind {
            OperationKind::Read => Self::bump(&self.reads_succeeded, "reads_succeeded"),
            OperationKind::Write => Self::bump(&self.writes_succeeded, "writes_succeeded"),
        }
    }

    fn on_failure(&self, event: &OperationEvent<'_>, _error: &FileError) {
        match event.kind {
            OperationKind::Read => Self::bump(&self.reads_failed, "reads_failed"),
            OperationKind::Write => Self::bump(&self.writes_failed, "writes_failed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reads_started: u64,
    pub reads_succeeded: u64,
    pub reads_failed: u64,
    pub writes_started: u64,
    pub writes_succeeded: u64,
    pub writes_failed: u64,
}
