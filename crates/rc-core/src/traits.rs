//! Core traits shared by the domain models

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Primary key type. Every entity is keyed by a random UUID assigned at construction.
pub type Id = Uuid;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Id;
}

/// Trait for entities with timestamps (created, updated)
pub trait Timestamped {
    fn created(&self) -> DateTime<Utc>;
    fn updated(&self) -> DateTime<Utc>;
}

/// Trait for entities that belong to a project
pub trait ProjectScoped {
    fn project_id(&self) -> Id;
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Timestamped + Send + Sync {
    /// The storage table name
    const TABLE_NAME: &'static str;

    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}

/// Generate a fresh primary key
pub fn new_id() -> Id {
    Uuid::new_v4()
}
