//! State shared by nested serializers
//!
//! Import creates parents before their children. The parents created so
//! far, together with the ids they had in the archive, are kept in named
//! slots so nested serializers can bind to them and locate their files.

use rc_attachments::{ImageProcessor, Storage, StoredFile};
use rc_core::config::ImportConfig;
use rc_core::traits::Id;
use rc_db::Store;
use rc_models::{PentestProject, ProjectType};

use crate::container::ArchiveReader;
use crate::error::{ArchiveError, ArchiveResult};

/// A created parent together with its id in the archive
#[derive(Debug, Clone)]
pub struct Bound<T> {
    pub entity: T,
    /// Id the entity had in the source system; names its file directory
    pub correlation_id: Id,
}

/// Everything an import needs besides the document itself
pub struct ImportContext<'a> {
    pub store: &'a dyn Store,
    pub archive: &'a dyn ArchiveReader,
    pub storage: &'a dyn Storage,
    pub processor: &'a dyn ImageProcessor,
    pub config: &'a ImportConfig,
    project: Option<Bound<PentestProject>>,
    project_type: Option<Bound<ProjectType>>,
    stored_files: Vec<StoredFile>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        store: &'a dyn Store,
        archive: &'a dyn ArchiveReader,
        storage: &'a dyn Storage,
        processor: &'a dyn ImageProcessor,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            store,
            archive,
            storage,
            processor,
            config,
            project: None,
            project_type: None,
            stored_files: Vec::new(),
        }
    }

    pub fn bind_project(&mut self, project: PentestProject, correlation_id: Id) {
        self.project = Some(Bound { entity: project, correlation_id });
    }

    pub fn bind_project_type(&mut self, project_type: ProjectType, correlation_id: Id) {
        self.project_type = Some(Bound { entity: project_type, correlation_id });
    }

    pub fn project(&self) -> ArchiveResult<&Bound<PentestProject>> {
        self.project.as_ref().ok_or(ArchiveError::MissingContext("project"))
    }

    pub fn project_type(&self) -> ArchiveResult<&Bound<ProjectType>> {
        self.project_type
            .as_ref()
            .ok_or(ArchiveError::MissingContext("project type"))
    }

    /// Replace the bound project type after it was changed, keeping its
    /// correlation id
    pub fn update_project_type(&mut self, project_type: ProjectType) -> ArchiveResult<()> {
        let bound = self
            .project_type
            .as_mut()
            .ok_or(ArchiveError::MissingContext("project type"))?;
        bound.entity = project_type;
        Ok(())
    }

    /// Forget bound parents before the next root document is imported
    pub fn reset_bindings(&mut self) {
        self.project = None;
        self.project_type = None;
    }

    pub fn record_stored_file(&mut self, file: StoredFile) {
        self.stored_files.push(file);
    }

    pub fn stored_files(&self) -> &[StoredFile] {
        &self.stored_files
    }

    pub fn into_stored_files(self) -> Vec<StoredFile> {
        self.stored_files
    }
}

/// Collaborators needed to export documents and their files
#[derive(Clone, Copy)]
pub struct ExportContext<'a> {
    pub store: &'a dyn Store,
    pub storage: &'a dyn Storage,
}

impl<'a> ExportContext<'a> {
    pub fn new(store: &'a dyn Store, storage: &'a dyn Storage) -> Self {
        Self { store, storage }
    }
}
