//! Result type aliases and load state
//!
//! Backend reads never collapse "failed" into "empty": a collection that could
//! not be fetched is `LoadState::Failed` and carries the reason, so callers can
//! offer a retry instead of rendering zero rows.

use serde::Serialize;

use crate::error::TbError;

/// Standard Result type for Taskboard operations
pub type TbResult<T> = Result<T, TbError>;

/// State of a collection fetched from the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState<T> {
    /// Nothing requested yet
    NotLoaded,
    /// Fetch succeeded (the data may legitimately be empty)
    Loaded { data: T },
    /// Fetch failed; the previous data is not kept
    Failed { reason: String },
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::NotLoaded
    }
}

impl<T> LoadState<T> {
    pub fn loaded(data: T) -> Self {
        LoadState::Loaded { data }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        LoadState::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }

    /// Borrow the data if the fetch succeeded
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded { data } => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Loaded { data } => Some(data),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            LoadState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> LoadState<U> {
        match self {
            LoadState::NotLoaded => LoadState::NotLoaded,
            LoadState::Loaded { data } => LoadState::Loaded { data: f(data) },
            LoadState::Failed { reason } => LoadState::Failed { reason },
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for LoadState<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => LoadState::loaded(data),
            Err(e) => LoadState::failed(e.to_string()),
        }
    }
}
