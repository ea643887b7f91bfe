//! API request handlers

pub mod tasks;
pub mod board;
pub mod statistics;
pub mod comments;
pub mod selection;
pub mod tags;

use tb_core::result::LoadState;
use tb_core::traits::Id;
use tb_db::Backend;
use tb_services::CompanyState;

use crate::error::{ApiError, ApiResult};

/// Unwrap a loaded collection or report why it is missing
pub(crate) fn loaded<T>(state: LoadState<T>, what: &str) -> ApiResult<T> {
    match state {
        LoadState::Loaded { data } => Ok(data),
        LoadState::Failed { reason } => Err(ApiError::backend(format!(
            "Failed to load {}: {}",
            what, reason
        ))),
        LoadState::NotLoaded => Err(ApiError::Unavailable(format!("{} not loaded yet", what))),
    }
}

/// Borrowing form of [`loaded`]
pub(crate) fn loaded_ref<'a, T>(state: &'a LoadState<T>, what: &str) -> ApiResult<&'a T> {
    match state {
        LoadState::Loaded { data } => Ok(data),
        LoadState::Failed { reason } => Err(ApiError::backend(format!(
            "Failed to load {}: {}",
            what, reason
        ))),
        LoadState::NotLoaded => Err(ApiError::Unavailable(format!("{} not loaded yet", what))),
    }
}

/// Fail with 404 unless `task_id` is one of the company's tasks
///
/// A miss reloads the company once, so a task created moments ago by
/// another client is still found.
pub(crate) async fn ensure_task_in_company(
    company: &CompanyState<dyn Backend>,
    task_id: Id,
) -> ApiResult<()> {
    if has_task(company, task_id).await? {
        return Ok(());
    }
    company.refresh().await;
    if has_task(company, task_id).await? {
        return Ok(());
    }

    tracing::debug!(company_id = %company.company_id(), %task_id, "Task is not in company");
    Err(ApiError::not_found("Task", task_id))
}

async fn has_task(company: &CompanyState<dyn Backend>, task_id: Id) -> ApiResult<bool> {
    company
        .read(|snapshot| {
            loaded_ref(&snapshot.tasks, "tasks").map(|tasks| tasks.iter().any(|t| t.id == task_id))
        })
        .await
}
