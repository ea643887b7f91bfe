//! Service errors
//!
//! Each service reports its own failure type. Resolution and write errors
//! convert into `TbError`; kanban errors are mapped by the HTTP layer.

use tb_core::error::{TbError, ValidationErrors};
use tb_core::traits::Id;
use tb_db::RepositoryError;
use tb_models::TaskStatus;
use thiserror::Error;

/// Join-table fetch failed; distinct from an empty mapping
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to resolve {mapping}: {source}")]
    Fetch {
        mapping: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl ResolveError {
    pub(crate) fn tags(source: RepositoryError) -> Self {
        ResolveError::Fetch {
            mapping: "task tags",
            source,
        }
    }

    pub(crate) fn assignees(source: RepositoryError) -> Self {
        ResolveError::Fetch {
            mapping: "task assignees",
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("Task {task_id} is not at {lane} #{index}")]
    StaleSource {
        task_id: Id,
        lane: TaskStatus,
        index: usize,
    },

    #[error("Index {index} is out of range for lane {lane} ({len} tasks)")]
    OutOfRange {
        lane: TaskStatus,
        index: usize,
        len: usize,
    },

    /// The move was applied locally but the backend rejected it
    #[error("Failed to move task {task_id} to {status}: {source}")]
    Write {
        task_id: Id,
        status: TaskStatus,
        #[source]
        source: RepositoryError,
    },
}

impl KanbanError {
    /// Whether the board should be reloaded from the backend
    pub fn needs_refresh(&self) -> bool {
        matches!(self, KanbanError::Write { .. })
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Failed to {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl WriteError {
    pub(crate) fn backend(action: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| WriteError::Backend { action, source }
    }
}

impl From<ResolveError> for TbError {
    fn from(err: ResolveError) -> Self {
        TbError::Backend(err.to_string())
    }
}

impl From<WriteError> for TbError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Validation(errors) => TbError::Validation(errors),
            WriteError::Backend {
                source: RepositoryError::NotFound(what),
                ..
            } => TbError::NotFound {
                entity: "Record",
                id: what,
            },
            other => TbError::Backend(other.to_string()),
        }
    }
}
