//! Tag management API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tb_core::traits::Id;
use tb_core::types::Color;
use tb_models::{Tag, TagDraft};
use tb_services::TagService;

use super::loaded_ref;
use crate::error::ApiResult;
use crate::extractors::AppState;

/// The company's tags, by name
///
/// GET /api/companies/:company_id/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
) -> ApiResult<Json<Vec<Tag>>> {
    let company = state.company(company_id).await;

    let mut tags: Vec<Tag> = company
        .read(|snapshot| loaded_ref(&snapshot.tags, "tags").map(|tags| tags.clone()))
        .await?;
    tags.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(tags))
}

/// POST /api/companies/:company_id/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
    Json(body): Json<SaveTagRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = TagService::new(state.backend()).with_feed(state.feed());
    let tag = service.save(body.into_draft(company_id, None)).await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

/// Rename or recolor a tag
///
/// PUT /api/companies/:company_id/tags/:tag_id
pub async fn update_tag(
    State(state): State<AppState>,
    Path((company_id, tag_id)): Path<(Id, Id)>,
    Json(body): Json<SaveTagRequest>,
) -> ApiResult<Json<Tag>> {
    let service = TagService::new(state.backend()).with_feed(state.feed());
    let tag = service.save(body.into_draft(company_id, Some(tag_id))).await?;

    Ok(Json(tag))
}

/// Delete a tag and unlink it from every task
///
/// DELETE /api/companies/:company_id/tags/:tag_id
pub async fn delete_tag(
    State(state): State<AppState>,
    Path((company_id, tag_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let service = TagService::new(state.backend()).with_feed(state.feed());
    service.delete(company_id, tag_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SaveTagRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<Color>,
}

impl SaveTagRequest {
    fn into_draft(self, company_id: Id, id: Option<Id>) -> TagDraft {
        TagDraft {
            id,
            name: self.name,
            color: self.color.unwrap_or_default(),
            company_id,
        }
    }
}
