//! Error types for the Canon engine.
//!
//! The taxonomy is a single flat enum. Port adapters produce
//! [`Error::RemoteUnavailable`], [`Error::OutOfDate`] and
//! [`Error::LocalStorage`]; the orchestrator wraps anything it cannot recover
//! from in [`Error::SyncFailure`] tagged with the [`Phase`] it happened in.

use crate::{SchemaName, VersionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Orchestrator phase a [`Error::SyncFailure`] was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InitialLoad,
    Sync,
    Destroy,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::InitialLoad => "initial_load",
            Phase::Sync => "sync",
            Phase::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fieldless discriminant of [`Error`], handy for matching and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RemoteUnavailable,
    OutOfDate,
    LocalStorage,
    InvalidSnapshot,
    Validation,
    SyncFailure,
}

/// All possible errors from the Canon engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Port errors
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote out of date: pushed against {base}, remote is at {actual}")]
    OutOfDate { base: VersionId, actual: VersionId },

    #[error("local storage failure: {0}")]
    LocalStorage(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // Validation errors
    #[error("schema not found: {0}")]
    SchemaNotFound(SchemaName),

    #[error("duplicate schema: {0}")]
    DuplicateSchema(SchemaName),

    #[error("duplicate record: {schema}/{id}")]
    DuplicateRecord { schema: SchemaName, id: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    // Orchestrator wrapper
    #[error("sync failed during {phase}: {cause}")]
    SyncFailure {
        phase: Phase,
        #[source]
        cause: Box<Error>,
    },
}

impl Error {
    /// Wrap `cause` as a failure of `phase`.
    pub fn sync_failure(phase: Phase, cause: Error) -> Self {
        Error::SyncFailure {
            phase,
            cause: Box::new(cause),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Error::OutOfDate { .. } => ErrorKind::OutOfDate,
            Error::LocalStorage(_) => ErrorKind::LocalStorage,
            Error::InvalidSnapshot(_) => ErrorKind::InvalidSnapshot,
            Error::SchemaNotFound(_)
            | Error::DuplicateSchema(_)
            | Error::DuplicateRecord { .. }
            | Error::InvalidPayload(_)
            | Error::MissingRequiredField(_)
            | Error::TypeMismatch { .. } => ErrorKind::Validation,
            Error::SyncFailure { .. } => ErrorKind::SyncFailure,
        }
    }

    /// Whether the retry policy may attempt the failed call again.
    ///
    /// Only transient remote failures qualify. `OutOfDate` can never succeed
    /// without a fresh fetch, so it is not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RemoteUnavailable(_))
    }

    /// Phase tag, if this is an orchestrator failure.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::SyncFailure { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Innermost non-wrapper error.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::SyncFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_retries must be at least 1, got {0}")]
    InvalidMaxRetries(u32),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}
