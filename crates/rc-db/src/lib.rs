//! # rc-db
//!
//! Repository layer for ReportCreator RS.
//!
//! This crate provides:
//!
//! - Repository traits per entity (templates, project types, projects, ...)
//! - The `Store` / `TransactionalStore` seams used by the archive importer
//! - An in-memory transactional store for tests and embedded use
//!
//! ## Example
//!
//! ```ignore
//! use rc_db::{MemoryStore, TransactionalStore, Transaction, ProjectRepository};
//!
//! let store = MemoryStore::new();
//! let tx = store.begin().await?;
//! let project = tx.create_project(project).await?;
//! tx.commit().await?;
//! ```

pub mod memory;
pub mod repository;

// Re-exports
pub use memory::{MemoryStore, MemoryTransaction, StateAccess, StoreState};
pub use repository::{
    FileRepository, FindingRepository, MemberRepository, ProjectRepository,
    ProjectTypeRepository, RepositoryError, RepositoryResult, SectionRepository, Store,
    TemplateRepository, Transaction, TransactionalStore, UserRepository,
};
