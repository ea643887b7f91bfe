//! Company selection API handlers
//!
//! The selection is kept in the local storage file so the server comes back
//! up with the same company loaded.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tb_core::traits::Id;

use crate::error::ApiResult;
use crate::extractors::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub company_id: Option<Id>,
}

/// GET /api/selection
pub async fn get_selection(State(state): State<AppState>) -> ApiResult<Json<Selection>> {
    let company_id = state.selection()?.selected_company()?;
    Ok(Json(Selection { company_id }))
}

/// Select a company, or clear the selection with `null`
///
/// PUT /api/selection
pub async fn put_selection(
    State(state): State<AppState>,
    Json(body): Json<Selection>,
) -> ApiResult<Json<Selection>> {
    let store = state.selection()?;

    match body.company_id {
        Some(company_id) => {
            store.select_company(company_id)?;
            state.company(company_id).await;
            tracing::info!(%company_id, "Company selected");
        }
        None => {
            store.clear_selection()?;
            tracing::info!("Company selection cleared");
        }
    }

    Ok(Json(body))
}
