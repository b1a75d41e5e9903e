//! Archive errors

use rc_attachments::{ProcessingError, StorageError};
use rc_core::error::{RcError, ValidationErrors};
use rc_db::RepositoryError;
use thiserror::Error;

/// Errors raised while exporting or importing archives
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The imported data is malformed; carries every problem by field path
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Entry not found in archive: {0}")]
    MissingEntry(String),

    #[error("Archive container error: {0}")]
    Container(String),

    #[error("Import context has no {0}")]
    MissingContext(&'static str),

    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

impl ArchiveError {
    /// A validation failure for the document as a whole
    pub fn invalid(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::Validation(errors)
    }

    pub fn container(err: impl std::fmt::Display) -> Self {
        Self::Container(err.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ArchiveError> for RcError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Validation(errors) => RcError::Validation(errors),
            ArchiveError::Repository(e) => e.into(),
            ArchiveError::Storage(e) => e.into(),
            ArchiveError::NotFound { entity, id } => RcError::NotFound {
                entity,
                field: "id",
                value: id,
            },
            other => RcError::Archive(other.to_string()),
        }
    }
}
