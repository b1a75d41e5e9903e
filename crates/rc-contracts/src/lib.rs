//! # rc-contracts
//!
//! Contract validation for ReportCreator RS.
//!
//! Contracts check imported documents before anything is written and
//! report every problem keyed by its field path.

pub mod base;
pub mod documents;
pub mod files;

pub use base::*;
pub use documents::{
    DocumentData, ProjectImportContract, ProjectTypeData, ProjectTypeImportContract,
    TemplateImportContract,
};
pub use files::{is_safe_file_name, FileNameContract};
