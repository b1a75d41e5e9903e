//! Result type aliases

use crate::error::ValidationErrors;

/// Result of a contract or document validation
pub type ValidationResult = Result<(), ValidationErrors>;
