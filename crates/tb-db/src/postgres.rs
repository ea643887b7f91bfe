//! PostgreSQL backend
//!
//! Reads and writes against the hosted schema: tasks, steps, tags,
//! task_tags, task_assignments and comments.

use async_trait::async_trait;
use sqlx::PgPool;
use tb_core::traits::Id;
use tb_models::{
    Assignment, AssignmentStatus, Comment, NewComment, Step, Tag, TagDraft, Task, TaskDraft,
    TaskStatus, TaskTag,
};

use crate::pool::Database;
use crate::repository::{
    JoinSource, RepositoryError, RepositoryResult, TaskSource, TaskWriter,
};
use crate::rows::{
    assignment_status_str, AssignmentRow, CommentRow, StepRow, TagRow, TaskRow, TaskTagRow,
};

const TASK_COLUMNS: &str = "id, title, description, status, priority, progress, \
     end_date::text AS end_date, company_id, created_at";

/// Backend implementation over a Postgres pool
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskSource for PgBackend {
    async fn fetch_tasks(&self, company_id: Id) -> RepositoryResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE company_id = $1 ORDER BY created_at ASC",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn fetch_steps(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Step>> {
        let rows = sqlx::query_as::<_, StepRow>(
            r#"
            SELECT id, title, description, is_completed, task_id
            FROM steps
            WHERE task_id = ANY($1)
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Step::from).collect())
    }

    async fn fetch_comments(&self, company_id: Id) -> RepositoryResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, comment, created_at, commentor, task_id, company
            FROM comments
            WHERE company = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn fetch_tags(&self, company_id: Id) -> RepositoryResult<Vec<Tag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, color, company_id, created_at
            FROM tags
            WHERE company_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }
}

#[async_trait]
impl JoinSource for PgBackend {
    async fn fetch_task_tags(&self, task_ids: &[Id]) -> RepositoryResult<Vec<TaskTag>> {
        let rows = sqlx::query_as::<_, TaskTagRow>(
            "SELECT task_id, tag_id FROM task_tags WHERE task_id = ANY($1)",
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TaskTag::from).collect())
    }

    async fn fetch_assignments(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, task_id, user_id, assigned_by, assigned_at, status
            FROM task_assignments
            WHERE task_id = ANY($1)
            "#,
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }
}

#[async_trait]
impl TaskWriter for PgBackend {
    async fn update_task_status(&self, task_id: Id, status: TaskStatus) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
            .bind(task_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    async fn save_task(&self, draft: &TaskDraft) -> RepositoryResult<Task> {
        let mut tx = self.pool.begin().await?;

        let row = match draft.id {
            Some(id) => {
                let sql = format!(
                    "UPDATE tasks SET title = $2, description = $3, company_id = $4 \
                     WHERE id = $1 RETURNING {}",
                    TASK_COLUMNS
                );
                sqlx::query_as::<_, TaskRow>(&sql)
                    .bind(id)
                    .bind(&draft.title)
                    .bind(&draft.description)
                    .bind(draft.company_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))?
            }
            None => {
                let sql = format!(
                    "INSERT INTO tasks (title, description, company_id) \
                     VALUES ($1, $2, $3) RETURNING {}",
                    TASK_COLUMNS
                );
                sqlx::query_as::<_, TaskRow>(&sql)
                    .bind(&draft.title)
                    .bind(&draft.description)
                    .bind(draft.company_id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        for step in &draft.existing_steps {
            sqlx::query(
                "UPDATE steps SET title = $2, description = $3, is_completed = $4 WHERE id = $1",
            )
            .bind(step.id)
            .bind(&step.title)
            .bind(&step.description)
            .bind(step.is_completed)
            .execute(&mut *tx)
            .await?;
        }

        for step in &draft.new_steps {
            sqlx::query(
                "INSERT INTO steps (title, description, is_completed, task_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(&step.title)
            .bind(&step.description)
            .bind(step.is_completed)
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            task_id = %row.id,
            updated_steps = draft.existing_steps.len(),
            new_steps = draft.new_steps.len(),
            "Task saved"
        );

        Ok(row.into())
    }

    async fn replace_task_tags(&self, task_id: Id, tag_ids: &[Id]) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        if !tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO task_tags (task_id, tag_id) SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(task_id)
            .bind(tag_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn replace_assignments(
        &self,
        task_id: Id,
        user_ids: &[Id],
        assigned_by: Id,
    ) -> RepositoryResult<Vec<Assignment>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_assignments WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;

        let rows = if user_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, AssignmentRow>(
                r#"
                INSERT INTO task_assignments (task_id, user_id, assigned_by, status)
                SELECT $1, UNNEST($2::uuid[]), $3, $4
                RETURNING id, task_id, user_id, assigned_by, assigned_at, status
                "#,
            )
            .bind(task_id)
            .bind(user_ids)
            .bind(assigned_by)
            .bind(assignment_status_str(AssignmentStatus::Pending))
            .fetch_all(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn insert_comment(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (comment, task_id, company, commentor)
            VALUES ($1, $2, $3, $4)
            RETURNING id, comment, created_at, commentor, task_id, company
            "#,
        )
        .bind(&comment.text)
        .bind(comment.task_id)
        .bind(comment.company_id)
        .bind(comment.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn save_tag(&self, draft: &TagDraft) -> RepositoryResult<Tag> {
        let row = match draft.id {
            Some(id) => sqlx::query_as::<_, TagRow>(
                r#"
                UPDATE tags SET name = $2, color = $3
                WHERE id = $1 AND company_id = $4
                RETURNING id, name, color, company_id, created_at
                "#,
            )
            .bind(id)
            .bind(&draft.name)
            .bind(draft.color.as_str())
            .bind(draft.company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("tag {}", id)))?,
            None => sqlx::query_as::<_, TagRow>(
                r#"
                INSERT INTO tags (name, color, company_id)
                VALUES ($1, $2, $3)
                RETURNING id, name, color, company_id, created_at
                "#,
            )
            .bind(&draft.name)
            .bind(draft.color.as_str())
            .bind(draft.company_id)
            .fetch_one(&self.pool)
            .await?,
        };

        Ok(row.into())
    }

    async fn delete_tag(&self, company_id: Id, tag_id: Id) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM task_tags
            WHERE tag_id = $1
              AND EXISTS (SELECT 1 FROM tags WHERE id = $1 AND company_id = $2)
            "#,
        )
        .bind(tag_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM tags WHERE id = $1 AND company_id = $2")
            .bind(tag_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("tag {}", tag_id)));
        }

        tx.commit().await?;
        tracing::debug!(%tag_id, "Tag deleted");
        Ok(())
    }
}
