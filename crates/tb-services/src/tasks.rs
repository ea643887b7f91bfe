//! Task save service
//!
//! Validates a draft, then creates or updates the task with its steps,
//! replaces its tag links (only when tags were selected) and replaces its
//! assignments. Every successful save is published on the change feed.

use std::sync::Arc;

use serde::Serialize;
use tb_contracts::{Contract, SaveTaskContract};
use tb_core::traits::Id;
use tb_db::TaskWriter;
use tb_models::{Assignment, Task, TaskDraft};

use crate::error::WriteError;
use crate::realtime::{ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};

/// A saved task with the assignments it now has
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedTask {
    pub task: Task,
    pub assignments: Vec<Assignment>,
    pub created: bool,
}

pub struct TaskService<W: TaskWriter + ?Sized> {
    writer: Arc<W>,
    feed: Option<ChangeFeed>,
    contract: SaveTaskContract,
}

impl<W: TaskWriter + ?Sized> TaskService<W> {
    pub fn new(writer: Arc<W>) -> Self {
        Self {
            writer,
            feed: None,
            contract: SaveTaskContract::new(),
        }
    }

    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Save a draft on behalf of `actor`
    pub async fn save(&self, draft: TaskDraft, actor: Id) -> Result<SavedTask, WriteError> {
        self.contract.validate(&draft)?;

        let mut draft = draft;
        draft.new_steps = draft
            .new_steps
            .into_iter()
            .map(|step| step.with_defaults())
            .collect();
        let created = !draft.is_update();

        let task = self
            .writer
            .save_task(&draft)
            .await
            .map_err(WriteError::backend("save task"))?;

        if !draft.tag_ids.is_empty() {
            self.writer
                .replace_task_tags(task.id, &draft.tag_ids)
                .await
                .map_err(WriteError::backend("save task tags"))?;
        }

        let assignments = self
            .writer
            .replace_assignments(task.id, &draft.assignee_ids, actor)
            .await
            .map_err(WriteError::backend("save task assignments"))?;

        tracing::info!(
            task_id = %task.id,
            created,
            steps = draft.existing_steps.len() + draft.new_steps.len(),
            assignees = assignments.len(),
            "Task saved"
        );

        self.publish(&task, created, &draft);

        Ok(SavedTask {
            task,
            assignments,
            created,
        })
    }

    fn publish(&self, task: &Task, created: bool, draft: &TaskDraft) {
        let Some(feed) = &self.feed else {
            return;
        };
        let kind = if created {
            ChangeKind::Insert
        } else {
            ChangeKind::Update
        };
        feed.publish(ChangeEvent::new(ChangeTable::Tasks, kind, task.company_id).with_record(task));

        // Step ids are assigned by the backend, so listeners reload steps.
        if !draft.existing_steps.is_empty() || !draft.new_steps.is_empty() {
            feed.publish(ChangeEvent::new(
                ChangeTable::Steps,
                ChangeKind::Update,
                task.company_id,
            ));
        }
    }
}
