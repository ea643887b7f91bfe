//! In-memory backend for development and testing
//!
//! Behaves like the Postgres backend for every trait method. Each call is
//! recorded so tests can count round trips, and any operation can be made
//! to fail on demand.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tb_core::traits::Id;
use tb_models::{
    Assignment, AssignmentStatus, Comment, NewComment, Step, Tag, TagDraft, Task, TaskDraft,
    TaskStatus, TaskTag,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{
    JoinSource, RepositoryError, RepositoryResult, TaskSource, TaskWriter,
};

/// Backend operations, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchTasks,
    FetchSteps,
    FetchComments,
    FetchTags,
    FetchTaskTags,
    FetchAssignments,
    UpdateTaskStatus,
    SaveTask,
    ReplaceTaskTags,
    ReplaceAssignments,
    InsertComment,
    SaveTag,
    DeleteTag,
}

#[derive(Debug, Default)]
struct MemoryData {
    tasks: Vec<Task>,
    steps: Vec<Step>,
    tags: Vec<Tag>,
    task_tags: Vec<TaskTag>,
    assignments: Vec<Assignment>,
    comments: Vec<Comment>,
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryBackend {
    data: RwLock<MemoryData>,
    calls: RwLock<Vec<Operation>>,
    failing: RwLock<HashSet<Operation>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding

    pub async fn insert_task(&self, task: Task) {
        self.data.write().await.tasks.push(task);
    }

    pub async fn insert_step(&self, step: Step) {
        self.data.write().await.steps.push(step);
    }

    pub async fn insert_tag(&self, tag: Tag) {
        self.data.write().await.tags.push(tag);
    }

    pub async fn tag_task(&self, task_id: Id, tag_id: Id) {
        self.data
            .write()
            .await
            .task_tags
            .push(TaskTag::new(task_id, tag_id));
    }

    pub async fn insert_assignment(&self, assignment: Assignment) {
        self.data.write().await.assignments.push(assignment);
    }

    pub async fn insert_comment_row(&self, comment: Comment) {
        self.data.write().await.comments.push(comment);
    }

    pub async fn task(&self, id: Id) -> Option<Task> {
        self.data
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    // Call log and failure injection

    /// Make every subsequent call of `op` fail until `recover` is called
    pub async fn fail(&self, op: Operation) {
        self.failing.write().await.insert(op);
    }

    pub async fn recover(&self, op: Operation) {
        self.failing.write().await.remove(&op);
    }

    pub async fn calls(&self) -> Vec<Operation> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, op: Operation) -> usize {
        self.calls.read().await.iter().filter(|c| **c == op).count()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn enter(&self, op: Operation) -> RepositoryResult<()> {
        self.calls.write().await.push(op);
        if self.failing.read().await.contains(&op) {
            return Err(RepositoryError::Unavailable(format!("{:?} failed", op)));
        }
        Ok(())
    }
}

fn id_set(ids: &[Id]) -> HashSet<Id> {
    ids.iter().copied().collect()
}

#[async_trait]
impl TaskSource for MemoryBackend {
    async fn fetch_tasks(&self, company_id: Id) -> RepositoryResult<Vec<Task>> {
        self.enter(Operation::FetchTasks).await?;
        let data = self.data.read().await;
        Ok(data
            .tasks
            .iter()
            .filter(|t| t.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn fetch_steps(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Step>> {
        self.enter(Operation::FetchSteps).await?;
        let wanted = id_set(task_ids);
        let data = self.data.read().await;
        Ok(data
            .steps
            .iter()
            .filter(|s| wanted.contains(&s.task_id))
            .cloned()
            .collect())
    }

    async fn fetch_comments(&self, company_id: Id) -> RepositoryResult<Vec<Comment>> {
        self.enter(Operation::FetchComments).await?;
        let data = self.data.read().await;
        Ok(data
            .comments
            .iter()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn fetch_tags(&self, company_id: Id) -> RepositoryResult<Vec<Tag>> {
        self.enter(Operation::FetchTags).await?;
        let data = self.data.read().await;
        Ok(data
            .tags
            .iter()
            .filter(|t| t.company_id == company_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JoinSource for MemoryBackend {
    async fn fetch_task_tags(&self, task_ids: &[Id]) -> RepositoryResult<Vec<TaskTag>> {
        self.enter(Operation::FetchTaskTags).await?;
        let wanted = id_set(task_ids);
        let data = self.data.read().await;
        Ok(data
            .task_tags
            .iter()
            .filter(|tt| wanted.contains(&tt.task_id))
            .copied()
            .collect())
    }

    async fn fetch_assignments(&self, task_ids: &[Id]) -> RepositoryResult<Vec<Assignment>> {
        self.enter(Operation::FetchAssignments).await?;
        let wanted = id_set(task_ids);
        let data = self.data.read().await;
        Ok(data
            .assignments
            .iter()
            .filter(|a| wanted.contains(&a.task_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskWriter for MemoryBackend {
    async fn update_task_status(&self, task_id: Id, status: TaskStatus) -> RepositoryResult<()> {
        self.enter(Operation::UpdateTaskStatus).await?;
        let mut data = self.data.write().await;
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", task_id)))?;
        task.status = status;
        Ok(())
    }

    async fn save_task(&self, draft: &TaskDraft) -> RepositoryResult<Task> {
        self.enter(Operation::SaveTask).await?;
        let mut data = self.data.write().await;

        let task = match draft.id {
            Some(id) => {
                let task = data
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| RepositoryError::NotFound(format!("task {}", id)))?;
                task.title = draft.title.clone();
                task.description = draft.description.clone();
                task.company_id = draft.company_id;
                task.clone()
            }
            None => {
                let mut task = Task::new(Uuid::new_v4(), draft.company_id, draft.title.clone());
                task.description = draft.description.clone();
                task.created_at = Some(Utc::now());
                data.tasks.push(task.clone());
                task
            }
        };

        let updates: HashMap<Id, _> = draft.existing_steps.iter().map(|s| (s.id, s)).collect();
        for step in data.steps.iter_mut() {
            if let Some(update) = updates.get(&step.id) {
                step.title = update.title.clone();
                step.description = update.description.clone();
                step.is_completed = update.is_completed;
            }
        }

        for step in &draft.new_steps {
            data.steps.push(Step {
                id: Uuid::new_v4(),
                title: step.title.clone(),
                description: step.description.clone(),
                is_completed: step.is_completed,
                task_id: task.id,
            });
        }

        Ok(task)
    }

    async fn replace_task_tags(&self, task_id: Id, tag_ids: &[Id]) -> RepositoryResult<()> {
        self.enter(Operation::ReplaceTaskTags).await?;
        let mut data = self.data.write().await;
        data.task_tags.retain(|tt| tt.task_id != task_id);
        data.task_tags
            .extend(tag_ids.iter().map(|tag_id| TaskTag::new(task_id, *tag_id)));
        Ok(())
    }

    async fn replace_assignments(
        &self,
        task_id: Id,
        user_ids: &[Id],
        assigned_by: Id,
    ) -> RepositoryResult<Vec<Assignment>> {
        self.enter(Operation::ReplaceAssignments).await?;
        let mut data = self.data.write().await;
        data.assignments.retain(|a| a.task_id != task_id);

        let now = Utc::now();
        let created: Vec<Assignment> = user_ids
            .iter()
            .map(|user_id| Assignment {
                id: Uuid::new_v4(),
                task_id,
                user_id: *user_id,
                assigned_by,
                assigned_at: Some(now),
                status: AssignmentStatus::Pending,
            })
            .collect();
        data.assignments.extend(created.iter().cloned());
        Ok(created)
    }

    async fn insert_comment(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        self.enter(Operation::InsertComment).await?;
        let row = Comment {
            id: Uuid::new_v4(),
            text: comment.text.clone(),
            created_at: Utc::now(),
            author_id: comment.author_id,
            task_id: comment.task_id,
            company_id: comment.company_id,
        };
        self.data.write().await.comments.push(row.clone());
        Ok(row)
    }

    async fn save_tag(&self, draft: &TagDraft) -> RepositoryResult<Tag> {
        self.enter(Operation::SaveTag).await?;
        let mut data = self.data.write().await;

        match draft.id {
            Some(id) => {
                let tag = data
                    .tags
                    .iter_mut()
                    .find(|t| t.id == id && t.company_id == draft.company_id)
                    .ok_or_else(|| RepositoryError::NotFound(format!("tag {}", id)))?;
                tag.name = draft.name.clone();
                tag.color = draft.color.clone();
                Ok(tag.clone())
            }
            None => {
                let tag = Tag {
                    id: Uuid::new_v4(),
                    name: draft.name.clone(),
                    color: draft.color.clone(),
                    company_id: draft.company_id,
                    created_at: Some(Utc::now()),
                };
                data.tags.push(tag.clone());
                Ok(tag)
            }
        }
    }

    async fn delete_tag(&self, company_id: Id, tag_id: Id) -> RepositoryResult<()> {
        self.enter(Operation::DeleteTag).await?;
        let mut data = self.data.write().await;

        let before = data.tags.len();
        data.tags
            .retain(|t| !(t.id == tag_id && t.company_id == company_id));
        if data.tags.len() == before {
            return Err(RepositoryError::NotFound(format!("tag {}", tag_id)));
        }
        data.task_tags.retain(|tt| tt.tag_id != tag_id);
        Ok(())
    }
}
