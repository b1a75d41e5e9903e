//! Contracts for imported root documents

use std::collections::HashSet;
use std::sync::LazyLock;

use rc_core::error::ValidationErrors;
use regex::Regex;

use crate::base::{Contract, ValidationResult};

/// Language codes such as `en-US`, `de-DE` or `en`
static LANGUAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").unwrap()
});

const MAX_NAME_LENGTH: usize = 255;
const MAX_LANGUAGE_LENGTH: usize = 16;

/// Common attributes of imported documents
pub trait DocumentData: Send + Sync {
    fn name(&self) -> &str;
    fn language(&self) -> &str;
}

/// Project type attributes checked on import
pub trait ProjectTypeData: DocumentData {
    fn section_ids(&self) -> Vec<&str>;
}

fn validate_name(name: &str, errors: &mut ValidationErrors) {
    if name.trim().is_empty() {
        errors.add("name", "can't be blank");
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("is too long (maximum is {} characters)", MAX_NAME_LENGTH),
        );
    }
}

fn validate_language(language: &str, errors: &mut ValidationErrors) {
    if language.is_empty() {
        errors.add("language", "can't be blank");
    } else if language.len() > MAX_LANGUAGE_LENGTH {
        errors.add(
            "language",
            format!("is too long (maximum is {} characters)", MAX_LANGUAGE_LENGTH),
        );
    } else if !LANGUAGE_PATTERN.is_match(language) {
        errors.add("language", format!("is not a valid language code: {}", language));
    }
}

/// Contract for `projects/v1` documents
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectImportContract;

impl<T: DocumentData> Contract<T> for ProjectImportContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        validate_name(entity.name(), &mut errors);
        validate_language(entity.language(), &mut errors);
        errors.into_result()
    }
}

/// Contract for `projecttypes/v1` documents
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectTypeImportContract;

impl<T: ProjectTypeData> Contract<T> for ProjectTypeImportContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        validate_name(entity.name(), &mut errors);
        validate_language(entity.language(), &mut errors);

        let mut seen = HashSet::new();
        for (idx, id) in entity.section_ids().into_iter().enumerate() {
            if id.trim().is_empty() {
                errors.add(format!("report_sections[{}].id", idx), "can't be blank");
            } else if !seen.insert(id) {
                errors.add(
                    format!("report_sections[{}].id", idx),
                    format!("duplicate section id: {}", id),
                );
            }
        }

        errors.into_result()
    }
}

/// Contract for `templates/v1` documents
///
/// Templates have no name of their own; only the language is checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateImportContract;

impl TemplateImportContract {
    pub fn validate_language(&self, language: &str) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        validate_language(language, &mut errors);
        errors.into_result()
    }
}
