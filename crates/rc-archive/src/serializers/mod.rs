//! Entity serializers
//!
//! Each root document type offers the same surface:
//!
//! - `export(ctx, entity)` builds the document for a stored entity
//! - `export_files(ctx, entity)` lazily yields its `(path, content)` pairs
//! - `validate(store)` checks the document and resolves members
//! - `create(ctx)` on the validated form writes the entity and its children

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ArchiveError, ArchiveResult};

pub mod files;
pub mod finding;
pub mod project;
pub mod project_type;
pub mod section;
pub mod template;

pub use files::{ArchiveEntry, FileDocument, FileEntrySerializer, FileStream};
pub use finding::FindingDocument;
pub use project::{ProjectDocument, ValidatedProject};
pub use project_type::ProjectTypeDocument;
pub use section::SectionDocument;
pub use template::TemplateDocument;

/// Deserialize a raw document; shape errors become validation errors
pub fn parse_document<T: DeserializeOwned>(value: Value) -> ArchiveResult<T> {
    serde_json::from_value(value).map_err(|e| ArchiveError::invalid(e.to_string()))
}

/// Imported timestamps, falling back to the current time
pub(crate) fn timestamps(
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    (created.unwrap_or(now), updated.unwrap_or(now))
}
