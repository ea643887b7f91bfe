//! Statistics API handler

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tb_core::traits::Id;
use tb_queries::TaskStatistics;

use super::loaded_ref;
use crate::error::ApiResult;
use crate::extractors::AppState;

/// Counts and recent activity over every task of the company
///
/// GET /api/companies/:company_id/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
) -> ApiResult<Json<TaskStatistics>> {
    let company = state.company(company_id).await;
    let now = Utc::now();

    let stats = company
        .read(|snapshot| {
            loaded_ref(&snapshot.tasks, "tasks").map(|tasks| TaskStatistics::compute(tasks, now))
        })
        .await?;

    Ok(Json(stats))
}
