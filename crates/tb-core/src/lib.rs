//! # tb-core
//!
//! Core types, traits, and utilities for Taskboard RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Load state for backend fetches (`LoadState`)
//! - Core traits (Entity, Identifiable, CompanyScoped)
//! - Shared value types (hex colors)
//! - Configuration and the persisted company selection

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
