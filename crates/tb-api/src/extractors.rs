//! Axum extractors and shared state for API handlers

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use tb_core::config::CompanySelectionStore;
use tb_core::traits::Id;
use tb_db::Backend;
use tb_queries::TaskQuery;
use tb_services::{ChangeFeed, CompanyState, StateRegistry};

use crate::error::{ApiError, ApiResult};

/// Header carrying the acting user's id
pub const ACTOR_HEADER: &str = "x-user-id";

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StateRegistry<dyn Backend>>,
    pub selection: Option<Arc<CompanySelectionStore>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, feed: ChangeFeed) -> Self {
        Self {
            registry: Arc::new(StateRegistry::new(backend, feed)),
            selection: None,
        }
    }

    pub fn with_selection(mut self, store: CompanySelectionStore) -> Self {
        self.selection = Some(Arc::new(store));
        self
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(self.registry.backend())
    }

    pub fn feed(&self) -> ChangeFeed {
        self.registry.feed().clone()
    }

    /// Loaded state for a company
    pub async fn company(&self, company_id: Id) -> Arc<CompanyState<dyn Backend>> {
        self.registry.loaded(company_id).await
    }

    pub fn selection(&self) -> ApiResult<&CompanySelectionStore> {
        self.selection
            .as_deref()
            .ok_or_else(|| ApiError::internal("Company selection is not configured"))
    }
}

/// The user performing a write, taken from `x-user-id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Id);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::bad_request(format!("Missing {} header", ACTOR_HEADER)))?;

        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<Id>().ok())
            .map(Actor)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {} header", ACTOR_HEADER)))
    }
}

/// Query string shared by the task list and the board
///
/// `tags` is a comma separated list of tag ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub query: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub sort: Option<String>,
    pub tags: Option<String>,
}

impl TaskListParams {
    pub fn to_query(&self) -> ApiResult<TaskQuery> {
        TaskQuery::parse(
            self.query.as_deref(),
            self.status.as_deref(),
            self.priority.as_deref(),
            self.sort.as_deref(),
            self.tags.as_deref(),
        )
        .map_err(ApiError::from)
    }
}
