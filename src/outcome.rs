//! Two-variant outcome of a file operation
//!
//! An [`Outcome`] is produced when a read concludes on a worker thread and is
//! immutable afterwards. Failures hold their cause behind an `Arc` so that
//! propagating a failure through [`Outcome::map`] keeps the identical cause
//! instead of wrapping or cloning it.

use std::fmt;
use std::sync::Arc;

use crate::error::FileError;

#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(Arc<FileError>),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Build a failure from a fresh error or an already shared cause
    pub fn failure(cause: impl Into<Arc<FileError>>) -> Self {
        Outcome::Failure(cause.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<FileError>> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(cause) => Some(cause),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn into_error(self) -> Option<Arc<FileError>> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(cause) => Some(cause),
        }
    }

    /// Transform the success value.
    ///
    /// A failure is returned as-is (same `Arc`) and `f` is never called.
    /// A panic raised by `f` is not caught here and unwinds to the caller.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(cause) => Outcome::Failure(cause),
        }
    }

    /// Chain a fallible step; failures short-circuit exactly like [`map`](Self::map)
    pub fn and_then<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(cause) => Outcome::Failure(cause),
        }
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(cause) => Outcome::Failure(Arc::clone(cause)),
        }
    }

    pub fn into_result(self) -> Result<T, Arc<FileError>> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(cause) => Err(cause),
        }
    }
}

impl<T: Clone> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Outcome::Success(value) => Outcome::Success(value.clone()),
            Outcome::Failure(cause) => Outcome::Failure(Arc::clone(cause)),
        }
    }
}

impl<T> From<Result<T, FileError>> for Outcome<T> {
    fn from(result: Result<T, FileError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::failure(err),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(value) => write!(f, "Success({value:?})"),
            Outcome::Failure(cause) => write!(f, "Failure({cause})"),
        }
    }
}
