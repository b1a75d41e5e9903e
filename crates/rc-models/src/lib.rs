//! # rc-models
//!
//! Domain models for ReportCreator RS.
//!
//! Plain entity structs for the pentest-reporting domain. Each model
//! implements the core traits from `rc-core` (Entity, Identifiable, ...).

pub use rc_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};

pub mod fields;
pub mod file;
pub mod finding;
pub mod member;
pub mod project;
pub mod project_type;
pub mod section;
pub mod template;
pub mod user;

pub use fields::{ensure_defined_structure, FieldDefinition, FieldDefinitions, FieldType, HandleUndefined};
pub use file::{FileKind, UploadedFile};
pub use finding::PentestFinding;
pub use member::{ImportedMember, ProjectMemberInfo};
pub use project::PentestProject;
pub use project_type::{ProjectType, ReportSectionDefinition};
pub use section::ReportSection;
pub use template::FindingTemplate;
pub use user::User;
