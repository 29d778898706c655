//! Workflow error taxonomy exposed to callers.
//!
//! # Responsibility
//! - Collapse repository, validation, and provider failures into a small set
//!   of stable kinds a boundary layer can map to transport codes.
//!
//! # Invariants
//! - Absent entities and entities owned by someone else are indistinguishable.
//! - `ErrorKind::code()` strings never change once published.

use crate::db::DbError;
use crate::generation::GenerationError;
use crate::model::label::LabelId;
use crate::model::refinement::{Difficulty, DifficultyParseError, PatchError};
use crate::model::text::TextLengthError;
use crate::repo::RepoError;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFoundOrForbidden,
    InvalidArgument,
    LimitExceeded,
    GenerationFailed,
    PersistenceConflict,
    PersistenceUnavailable,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFoundOrForbidden => "not_found_or_forbidden",
            Self::InvalidArgument => "invalid_argument",
            Self::LimitExceeded => "limit_exceeded",
            Self::GenerationFailed => "generation_failed",
            Self::PersistenceConflict => "persistence_conflict",
            Self::PersistenceUnavailable => "persistence_unavailable",
        }
    }

    /// Whether repeating the same call unchanged may succeed.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::GenerationFailed | Self::PersistenceUnavailable)
    }
}

/// Failure of a project or refinement workflow operation.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("not found or not owned by caller")]
    NotFoundOrForbidden,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("label limit exceeded: {existing} existing + {requested} requested > {max}")]
    LimitExceeded {
        existing: u32,
        requested: u32,
        max: u32,
    },
    /// Provider failed; nothing was written for `(label_id, difficulty)`.
    #[error("generation failed for label {label_id} ({difficulty}): {source}")]
    GenerationFailed {
        label_id: LabelId,
        difficulty: Difficulty,
        #[source]
        source: GenerationError,
    },
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFoundOrForbidden => ErrorKind::NotFoundOrForbidden,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::GenerationFailed { .. } => ErrorKind::GenerationFailed,
            Self::PersistenceConflict(_) => ErrorKind::PersistenceConflict,
            Self::PersistenceUnavailable(_) => ErrorKind::PersistenceUnavailable,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub(crate) fn generation(
        label_id: LabelId,
        difficulty: Difficulty,
        source: GenerationError,
    ) -> Self {
        Self::GenerationFailed {
            label_id,
            difficulty,
            source,
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(value: RepoError) -> Self {
        if value.is_constraint_violation() {
            return Self::PersistenceConflict(value.to_string());
        }
        match value {
            RepoError::NotFound { .. } => Self::NotFoundOrForbidden,
            RepoError::CapacityExceeded {
                existing,
                requested,
                max,
                ..
            } => Self::LimitExceeded {
                existing,
                requested,
                max,
            },
            RepoError::InvalidData(message) => Self::PersistenceConflict(message),
            RepoError::Db(DbError::UnsupportedSchemaVersion { .. })
            | RepoError::Db(DbError::Sqlite(_))
            | RepoError::UninitializedConnection { .. } => {
                Self::PersistenceUnavailable(value.to_string())
            }
        }
    }
}

impl From<DifficultyParseError> for WorkflowError {
    fn from(value: DifficultyParseError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<TextLengthError> for WorkflowError {
    fn from(value: TextLengthError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<PatchError> for WorkflowError {
    fn from(value: PatchError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}
