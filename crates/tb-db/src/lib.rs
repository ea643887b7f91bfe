//! # tb-db
//!
//! Backend data access for Taskboard RS.
//!
//! This crate provides:
//!
//! - Connection pool management
//! - The `TaskSource`, `JoinSource` and `TaskWriter` traits
//! - A PostgreSQL backend using SQLx
//! - An in-memory backend for development and tests
//!
//! ## Example
//!
//! ```ignore
//! use tb_core::config::AppConfig;
//! use tb_db::{Database, PgBackend, TaskSource};
//!
//! let config = AppConfig::from_env()?;
//! let db = Database::connect(&config.database).await?;
//!
//! let backend = PgBackend::from_database(&db);
//! let tasks = backend.fetch_tasks(company_id).await?;
//! ```

pub mod pool;
pub mod repository;
pub mod rows;
pub mod postgres;
pub mod memory;

// Re-exports
pub use pool::{Database, PoolStats};
pub use repository::{
    Backend, JoinSource, RepositoryError, RepositoryResult, TaskSource, TaskWriter,
};
pub use postgres::PgBackend;
pub use memory::{MemoryBackend, Operation};
