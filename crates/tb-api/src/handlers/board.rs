//! Kanban board API handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tb_core::traits::Id;
use tb_models::{Task, TaskStatus};
use tb_services::{CompanySnapshot, DragEnd, MoveEffect};

use super::loaded_ref;
use crate::error::ApiResult;
use crate::extractors::{AppState, TaskListParams};

/// Board lanes for the tasks matching the query
///
/// GET /api/companies/:company_id/board
///
/// A company has a single board shared by every client. The query becomes
/// that board's query; lanes are rebuilt from it and any local order from
/// earlier drags is dropped. Moves are checked against the lanes of the most
/// recent query, so a client whose view was replaced gets 409 on its next
/// move and should fetch the board again.
pub async fn get_board(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<BoardView>> {
    let query = params.to_query()?;
    let company = state.company(company_id).await;

    company.set_board_query(query).await;
    let view = company.read(BoardView::from_snapshot).await?;

    Ok(Json(view))
}

/// Apply the end of a drag
///
/// POST /api/companies/:company_id/board/moves
///
/// A failed status write is reported as a backend error; the board has
/// been reloaded by then, so the client should fetch it again.
pub async fn move_task(
    State(state): State<AppState>,
    Path(company_id): Path<Id>,
    Json(drag): Json<DragEnd>,
) -> ApiResult<Json<MoveResult>> {
    let company = state.company(company_id).await;

    let effect = company.move_task(&drag).await?;
    let board = company.read(BoardView::from_snapshot).await?;

    tracing::debug!(%company_id, task_id = %drag.task_id, ?effect, "Board move applied");

    Ok(Json(MoveResult { effect, board }))
}

#[derive(Debug, Serialize)]
pub struct LaneView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct BoardView {
    pub lanes: Vec<LaneView>,
    pub generation: u64,
}

impl BoardView {
    fn from_snapshot(snapshot: &CompanySnapshot) -> ApiResult<Self> {
        let tasks: HashMap<Id, &Task> = loaded_ref(&snapshot.tasks, "tasks")?
            .iter()
            .map(|task| (task.id, task))
            .collect();

        let lanes = snapshot
            .board
            .lanes()
            .map(|(status, ids)| LaneView {
                status,
                tasks: ids
                    .iter()
                    .filter_map(|id| tasks.get(id).map(|task| (*task).clone()))
                    .collect(),
            })
            .collect();

        Ok(Self {
            lanes,
            generation: snapshot.generation,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResult {
    #[serde(flatten)]
    pub effect: MoveEffect,
    pub board: BoardView,
}
