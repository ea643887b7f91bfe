//! # tb-api
//!
//! JSON HTTP API for Taskboard RS.
//!
//! Every task route is scoped to a company:
//! `/api/companies/:company_id/{tasks,board,statistics}`. The active company
//! selection lives under `/api/selection`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AppState;
pub use routes::router;
