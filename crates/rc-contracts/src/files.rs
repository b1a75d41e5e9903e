//! File name contract
//!
//! File names from archives end up in archive paths and storage keys, so
//! anything that could escape the intended directory is rejected.

use rc_core::error::ValidationErrors;

use crate::base::{Contract, ValidationResult};

/// Maximum length of an uploaded file name
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// A name is safe when it is a single path component
pub fn is_safe_file_name(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && !name.contains('\0')
}

/// Validates names of uploaded images and assets
#[derive(Debug, Default, Clone, Copy)]
pub struct FileNameContract;

impl FileNameContract {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_name(&self, name: &str, errors: &mut ValidationErrors) {
        if name.is_empty() {
            errors.add("name", "can't be blank");
            return;
        }

        if !is_safe_file_name(name) {
            errors.add("name", format!("Invalid filename: {}", name.escape_debug()));
            return;
        }

        if name == "." || name == ".." {
            errors.add("name", format!("Invalid filename: {}", name));
            return;
        }

        if name.len() > MAX_FILE_NAME_LENGTH {
            errors.add(
                "name",
                format!("is too long (maximum is {} characters)", MAX_FILE_NAME_LENGTH),
            );
        }
    }
}

impl Contract<str> for FileNameContract {
    fn validate(&self, name: &str) -> ValidationResult {
        let mut errors = ValidationErrors::new();
        self.validate_name(name, &mut errors);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        let contract = FileNameContract::new();
        for name in ["screenshot.png", "logo 2.svg", "..hidden", "ümlaut.jpg"] {
            assert!(contract.validate(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_rejects_path_components() {
        let contract = FileNameContract::new();
        for name in ["../etc/passwd", "a/b.png", "a\\b.png", "nul\0.png", "..", ""] {
            let result = contract.validate(name);
            assert!(result.is_err(), "{:?} should be rejected", name);
            assert!(result.unwrap_err().has_error("name"));
        }
    }

    #[test]
    fn test_error_message_names_the_file() {
        let errors = FileNameContract::new().validate("x/y.png").unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some(&vec!["Invalid filename: x/y.png".to_string()])
        );
    }

    #[test]
    fn test_too_long() {
        let name = format!("{}.png", "a".repeat(MAX_FILE_NAME_LENGTH));
        assert!(FileNameContract::new().validate(name.as_str()).is_err());
    }
}
