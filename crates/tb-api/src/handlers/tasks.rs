//! Task API handlers

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_models::{Comment, NewStep, Step, StepUpdate, Task, TaskDraft};
use tb_services::{AssigneeScope, RefreshOutcome, TaskService};

use super::loaded_ref;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Actor, AppState, TaskListParams};

/// List the company's tasks, filtered and sorted
///
/// GET /api/companies/:company_id/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<TaskList>> {
    let query = params.to_query()?;
    let company = state.company(company_id).await;

    let tasks = super::loaded(company.query(&query).await, "tasks")?;
    let generation = company.read(|snapshot| snapshot.generation).await;

    tracing::debug!(%company_id, count = tasks.len(), ?query, "Listed tasks");

    Ok(Json(TaskList {
        count: tasks.len(),
        tasks,
        generation,
    }))
}

/// A task with its steps, comments, tags and assignees
///
/// GET /api/companies/:company_id/tasks/:task_id
pub async fn get_task(
    State(state): State<AppState>,
    Path((company_id, task_id)): Path<(Id, Id)>,
) -> ApiResult<Json<TaskDetail>> {
    let company = state.company(company_id).await;

    let mut detail = company
        .read(|snapshot| -> ApiResult<TaskDetail> {
            let task = loaded_ref(&snapshot.tasks, "tasks")?
                .iter()
                .find(|task| task.id == task_id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Task", task_id))?;

            let steps = loaded_ref(&snapshot.steps, "steps")?
                .iter()
                .filter(|step| step.task_id == task_id)
                .cloned()
                .collect();

            let comments = loaded_ref(&snapshot.comments, "comments")?
                .iter()
                .filter(|comment| comment.task_id == task_id)
                .cloned()
                .collect();

            let tag_ids = loaded_ref(&snapshot.task_tags, "task tags")?
                .get(&task_id)
                .map(|tags| tags.iter().copied().collect())
                .unwrap_or_default();

            Ok(TaskDetail {
                task,
                steps,
                comments,
                tag_ids,
                assignee_ids: BTreeSet::new(),
            })
        })
        .await?;

    let assignees = company
        .resolver()
        .resolve_assignees(&[task_id], AssigneeScope::Any)
        .await?;
    detail.assignee_ids = assignees
        .get(&task_id)
        .map(|users| users.iter().copied().collect())
        .unwrap_or_default();

    Ok(Json(detail))
}

/// Create a task with its steps, tags and assignees
///
/// POST /api/companies/:company_id/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
    actor: Actor,
    Json(body): Json<SaveTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = body.into_draft(company_id, None);
    let service = TaskService::new(state.backend()).with_feed(state.feed());
    let saved = service.save(draft, actor.0).await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

/// Update a task in place; the task must belong to the company
///
/// PUT /api/companies/:company_id/tasks/:task_id
pub async fn update_task(
    State(state): State<AppState>,
    Path((company_id, task_id)): Path<(Id, Id)>,
    actor: Actor,
    Json(body): Json<SaveTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let company = state.company(company_id).await;
    super::ensure_task_in_company(&company, task_id).await?;

    let draft = body.into_draft(company_id, Some(task_id));
    let service = TaskService::new(state.backend()).with_feed(state.feed());
    let saved = service.save(draft, actor.0).await?;

    Ok(Json(saved))
}

/// Users assigned to a task
///
/// GET /api/companies/:company_id/tasks/:task_id/assignees?scope=accepted_only
pub async fn list_assignees(
    State(state): State<AppState>,
    Path((company_id, task_id)): Path<(Id, Id)>,
    Query(params): Query<AssigneeParams>,
) -> ApiResult<Json<AssigneeList>> {
    let company = state.company(company_id).await;
    let index = company
        .resolver()
        .resolve_assignees(&[task_id], params.scope)
        .await?;

    let user_ids = index
        .get(&task_id)
        .map(|users| users.iter().copied().collect())
        .unwrap_or_default();

    Ok(Json(AssigneeList {
        task_id,
        scope: params.scope,
        user_ids,
    }))
}

/// Reload every collection for the company
///
/// POST /api/companies/:company_id/refresh
pub async fn refresh_company(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
) -> ApiResult<Json<RefreshOutcome>> {
    let company = state.registry.get_or_create(company_id).await;
    Ok(Json(company.refresh().await))
}

// Request types
#[derive(Debug, Deserialize)]
pub struct SaveTaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub existing_steps: Vec<StepUpdate>,
    #[serde(default)]
    pub new_steps: Vec<NewStep>,
    #[serde(default)]
    pub tag_ids: Vec<Id>,
    #[serde(default)]
    pub assignee_ids: Vec<Id>,
}

impl SaveTaskRequest {
    fn into_draft(self, company_id: Id, id: Option<Id>) -> TaskDraft {
        TaskDraft {
            id,
            title: self.title,
            description: self.description,
            company_id,
            existing_steps: self.existing_steps,
            new_steps: self.new_steps,
            tag_ids: self.tag_ids,
            assignee_ids: self.assignee_ids,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssigneeParams {
    #[serde(default)]
    pub scope: AssigneeScope,
}

// Response types
#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub count: usize,
    pub generation: u64,
}

#[derive(Debug, Serialize)]
pub struct TaskDetail {
    pub task: Task,
    pub steps: Vec<Step>,
    pub comments: Vec<Comment>,
    pub tag_ids: BTreeSet<Id>,
    pub assignee_ids: BTreeSet<Id>,
}

#[derive(Debug, Serialize)]
pub struct AssigneeList {
    pub task_id: Id,
    pub scope: AssigneeScope,
    pub user_ids: BTreeSet<Id>,
}
