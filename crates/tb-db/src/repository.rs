//! Repository traits
//!
//! The backend is consumed through three narrow traits: reads scoped to a
//! company, batched join-table reads, and writes. Set-membership reads take
//! a slice of task ids and cost one round trip regardless of its length.

use async_trait::async_trait;
use tb_core::error::TbError;
use tb_core::traits::Id;
use tb_models::{
    Assignment, Comment, NewComment, Step, Tag, TagDraft, Task, TaskDraft, TaskStatus, TaskTag,
};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed row: {0}")]
    Decode(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for TbError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => TbError::NotFound {
                entity: "Record",
                id: what,
            },
            other => TbError::Backend(other.to_string()),
        }
    }
}

/// Company-scoped entity reads
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_tasks(&self, company_id: Id) -> RepositoryResult<Vec<Task>>;

    /// Steps belonging to any of `task_ids`
    async fn fetch_steps(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Step>>;

    async fn fetch_comments(&self, company_id: Id) -> RepositoryResult<Vec<Comment>>;

    async fn fetch_tags(&self, company_id: Id) -> RepositoryResult<Vec<Tag>>;
}

/// Join-table reads, batched by task id
#[async_trait]
pub trait JoinSource: Send + Sync {
    async fn fetch_task_tags(&self, task_ids: &[Id]) -> RepositoryResult<Vec<TaskTag>>;

    async fn fetch_assignments(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Assignment>>;
}

/// Writes
#[async_trait]
pub trait TaskWriter: Send + Sync {
    /// Single-field status update
    async fn update_task_status(&self, task_id: Id, status: TaskStatus) -> RepositoryResult<()>;

    /// Create or update a task together with its steps
    ///
    /// New steps are expected to already carry their placeholder text.
    async fn save_task(&self, draft: &TaskDraft) -> RepositoryResult<Task>;

    /// Replace every tag link of a task
    async fn replace_task_tags(&self, task_id: Id, tag_ids: &[Id]) -> RepositoryResult<()>;

    /// Replace every assignment of a task with pending ones
    async fn replace_assignments(
        &self,
        task_id: Id,
        user_ids: &[Id],
        assigned_by: Id,
    ) -> RepositoryResult<Vec<Assignment>>;

    async fn insert_comment(&self, comment: &NewComment) -> RepositoryResult<Comment>;

    /// Create or update a tag
    async fn save_tag(&self, draft: &TagDraft) -> RepositoryResult<Tag>;

    /// Delete one of a company's tags along with every task link to it
    async fn delete_tag(&self, company_id: Id, tag_id: Id) -> RepositoryResult<()>;
}

/// Everything the application needs from a backend
pub trait Backend: TaskSource + JoinSource + TaskWriter {}

impl<T: TaskSource + JoinSource + TaskWriter> Backend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: TbError = RepositoryError::NotFound("task 1".into()).into();
        assert_eq!(err.status_code(), 404);

        let err: TbError = RepositoryError::Unavailable("timeout".into()).into();
        assert_eq!(err.status_code(), 502);
    }
}
