//! # tb-queries
//!
//! Client-local query layer for Taskboard RS.
//!
//! Everything here is pure: no backend access, no side effects. The dashboard,
//! kanban and progress views all run their task lists through the same
//! filter and sort engines.
//!
//! ## Structure
//!
//! - `filters` - Filter specification and the filter engine
//! - `sorts` - Sort keys and the stable sort engine
//! - `query` - A filter plus a sort, parsed from request parameters
//! - `builder` - Fluent API for constructing queries
//! - `statistics` - Dashboard counters derived from a task list
//!
//! ## Example
//!
//! ```
//! use tb_queries::builder::TaskQueryBuilder;
//! use tb_models::TaskPriority;
//!
//! let query = TaskQueryBuilder::new()
//!     .search("invoice")
//!     .priority(TaskPriority::High)
//!     .sort_by_date()
//!     .build();
//!
//! assert!(!query.filter.is_unconstrained());
//! ```

pub mod filters;
pub mod sorts;
pub mod query;
pub mod builder;
pub mod statistics;

pub use filters::{filter_tasks, FilterSpec, Selection, TagIndex};
pub use sorts::{sort_tasks, SortKey};
pub use query::TaskQuery;
pub use builder::TaskQueryBuilder;
pub use statistics::TaskStatistics;
