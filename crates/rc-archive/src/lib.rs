//! # rc-archive
//!
//! Archive export and import for ReportCreator RS.
//!
//! ## Features
//!
//! - Versioned documents (`templates/v1`, `projecttypes/v1`, `projects/v1`)
//! - Best-effort references: dangling users and templates are dropped,
//!   unknown members are kept as detached snapshots
//! - Image and asset files stored next to their documents
//! - Transactional bundle import with cleanup of written files
//!
//! ## Example
//!
//! ```rust,ignore
//! use rc_archive::{ArchiveService, TarArchive};
//!
//! let archive = TarArchive::from_reader(std::fs::File::open("export.tar.gz")?)?;
//! let projects = service.import_projects(&archive).await?;
//! ```

pub mod container;
pub mod context;
pub mod error;
pub mod fields;
pub mod format;
pub mod serializers;
pub mod service;

pub use container::{ArchiveReader, ArchiveWriter, MemoryArchive, TarArchive, TarArchiveWriter};
pub use context::{Bound, ExportContext, ImportContext};
pub use error::{ArchiveError, ArchiveResult};
pub use fields::{Resolved, ResolvedMember, UserRef};
pub use format::{FormatTag, FormatVersion, ProjectTypesV1, ProjectsV1, TemplatesV1};
pub use serializers::{
    parse_document, ArchiveEntry, FileDocument, FileEntrySerializer, FindingDocument,
    ProjectDocument, ProjectTypeDocument, SectionDocument, TemplateDocument, ValidatedProject,
};
pub use service::ArchiveService;
