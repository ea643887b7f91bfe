//! Comment API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tb_core::traits::Id;
use tb_models::{Comment, NewComment};
use tb_services::CommentService;

use super::loaded_ref;
use crate::error::ApiResult;
use crate::extractors::{Actor, AppState};

/// Comments on a task, oldest first
///
/// GET /api/companies/:company_id/tasks/:task_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path((company_id, task_id)): Path<(Id, Id)>,
) -> ApiResult<Json<Vec<Comment>>> {
    let company = state.company(company_id).await;

    let mut comments: Vec<Comment> = company
        .read(|snapshot| {
            loaded_ref(&snapshot.comments, "comments").map(|all| {
                all.iter()
                    .filter(|comment| comment.task_id == task_id)
                    .cloned()
                    .collect()
            })
        })
        .await?;
    comments.sort_by_key(|comment| comment.created_at);

    Ok(Json(comments))
}

/// Post a comment as the acting user on one of the company's tasks
///
/// POST /api/companies/:company_id/tasks/:task_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path((company_id, task_id)): Path<(Id, Id)>,
    actor: Actor,
    Json(body): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let company = state.company(company_id).await;
    super::ensure_task_in_company(&company, task_id).await?;

    let comment = NewComment {
        text: body.comment,
        task_id,
        company_id,
        author_id: actor.0,
    };

    let service = CommentService::new(state.backend()).with_feed(state.feed());
    let created = service.add_comment(comment).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub comment: String,
}
