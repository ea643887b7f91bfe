//! Core traits shared by the domain models

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque identifier handed out by the backend
pub type Id = Uuid;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Id;
}

/// Trait for entities with a creation timestamp
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// Trait for entities that belong to a company (tenant)
pub trait CompanyScoped {
    fn company_id(&self) -> Id;
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Send + Sync {
    /// The backend table name
    const TABLE_NAME: &'static str;

    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}
