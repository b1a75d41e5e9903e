//! Core error types for ReportCreator RS
//!
//! Validation failures are collected per field path (`findings[2].template`,
//! `images[0].name`) so the caller can point at the offending part of a
//! nested import document.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Core error type for all ReportCreator operations
#[derive(Error, Debug)]
pub enum RcError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Validation errors collection
///
/// Field errors are keyed by their path inside the validated document.
/// Base errors apply to the document as a whole.
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Field-specific errors: field path -> messages
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join("; "))
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection holding a single field error
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field path
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field path
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Merge errors of a nested document under `prefix`.
    ///
    /// Field paths become `prefix.field`; base errors of the nested
    /// document are attached to `prefix` itself.
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors
                .entry(format!("{}.{}", prefix, field))
                .or_default()
                .extend(messages);
        }
        if !other.base_errors.is_empty() {
            self.errors
                .entry(prefix.to_string())
                .or_default()
                .extend(other.base_errors);
        }
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{}: {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// HTTP status code mapping for errors
impl RcError {
    pub fn status_code(&self) -> u16 {
        match self {
            RcError::NotFound { .. } => 404,
            RcError::Validation(_) => 422,
            RcError::Database(_) | RcError::Storage(_) | RcError::Internal(_) => 500,
            RcError::Archive(_) => 400,
            RcError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RcError::NotFound { .. } => "not_found",
            RcError::Validation(_) => "validation_failed",
            RcError::Database(_) => "database_error",
            RcError::Storage(_) => "storage_error",
            RcError::Archive(_) => "archive_error",
            RcError::Internal(_) => "internal_error",
            RcError::Config(_) => "configuration_error",
        }
    }
}
