//! # tb-contracts
//!
//! Contract validation for Taskboard RS.
//!
//! Contracts validate write payloads before anything is sent to the backend.
//! A rejected payload produces `ValidationErrors` keyed by attribute.

pub mod base;
pub mod tasks;
pub mod comments;
pub mod tags;

pub use base::*;
pub use tasks::SaveTaskContract;
pub use comments::CreateCommentContract;
pub use tags::SaveTagContract;
