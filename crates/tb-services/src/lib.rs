//! # tb-services
//!
//! Services for Taskboard RS.
//!
//! - `resolver` - Batched task -> tags and task -> assignees resolution
//! - `kanban` - Board lanes and drag-and-drop status transitions
//! - `state` - Per-company state container with generation-gated refresh
//! - `realtime` - Change feed and incremental reconciliation
//! - `tasks`, `comments`, `tags` - Validated writes

pub mod error;
pub mod resolver;
pub mod kanban;
pub mod state;
pub mod realtime;
pub mod tasks;
pub mod comments;
pub mod tags;

pub use error::{KanbanError, ResolveError, WriteError};
pub use resolver::{AssigneeIndex, AssigneeScope, Resolver, TaskLinks};
pub use kanban::{Board, DragEnd, KanbanService, MoveEffect, Position};
pub use state::{CompanySnapshot, CompanyState, RefreshOutcome, StateRegistry};
pub use realtime::{ApplyOutcome, ChangeEvent, ChangeFeed, ChangeKind, ChangeTable};
pub use tasks::{SavedTask, TaskService};
pub use comments::CommentService;
pub use tags::TagService;
