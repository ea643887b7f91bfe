//! # tb-models
//!
//! Domain models for Taskboard RS.
//!
//! Records are shaped the way the backend returns them. A task's tags and
//! assignees are never stored on the task itself; they are joined through
//! `TaskTag` and `Assignment` rows.

pub use tb_core::traits::{CompanyScoped, Entity, Id, Identifiable, Timestamped};

pub mod task;
pub mod step;
pub mod tag;
pub mod assignment;
pub mod comment;
pub mod dates;
pub mod draft;

pub use task::{Task, TaskPriority, TaskStatus};
pub use step::{Step, NO_DESCRIPTION, UNTITLED_STEP};
pub use tag::{Tag, TaskTag};
pub use assignment::{Assignment, AssignmentStatus};
pub use comment::Comment;
pub use draft::{NewComment, NewStep, StepUpdate, TagDraft, TaskDraft};
