//! Archive Service
//!
//! Imports and exports whole bundles. Every import runs in one store
//! transaction; when it fails the transaction is rolled back and the
//! files already written to storage are deleted again.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use rc_attachments::{delete_stored_files, ImageProcessor, Storage};
use rc_core::config::{ExportConfig, ImportConfig};
use rc_core::traits::Id;
use rc_core::types::Source;
use rc_db::{Transaction, TransactionalStore};
use rc_models::{FindingTemplate, PentestProject, ProjectType};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::container::{ArchiveReader, ArchiveWriter, TarArchiveWriter};
use crate::context::{ExportContext, ImportContext};
use crate::error::{ArchiveError, ArchiveResult};
use crate::serializers::{
    parse_document, FileStream, ProjectDocument, ProjectTypeDocument, TemplateDocument,
};

/// A document that can be imported from the top level of an archive
#[async_trait]
trait RootDocument: DeserializeOwned + Send {
    type Output: Send;

    /// Checks that need neither the store nor the archive files
    fn check(&self) -> ArchiveResult<()>;

    async fn import(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<Self::Output>;
}

#[async_trait]
impl RootDocument for TemplateDocument {
    type Output = FindingTemplate;

    fn check(&self) -> ArchiveResult<()> {
        self.validate()
    }

    async fn import(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<FindingTemplate> {
        self.create(ctx).await
    }
}

#[async_trait]
impl RootDocument for ProjectTypeDocument {
    type Output = ProjectType;

    fn check(&self) -> ArchiveResult<()> {
        self.validate()
    }

    async fn import(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<ProjectType> {
        self.create(ctx, Source::Imported).await
    }
}

#[async_trait]
impl RootDocument for ProjectDocument {
    type Output = PentestProject;

    fn check(&self) -> ArchiveResult<()> {
        Ok(self.validation_errors().into_result()?)
    }

    async fn import(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<PentestProject> {
        let validated = self.validate(ctx.store).await?;
        validated.create(ctx).await
    }
}

/// Bundle import and export
pub struct ArchiveService<S: TransactionalStore> {
    store: Arc<S>,
    storage: Arc<dyn Storage>,
    processor: Arc<dyn ImageProcessor>,
    import_config: ImportConfig,
    export_config: ExportConfig,
}

impl<S: TransactionalStore> ArchiveService<S> {
    pub fn new(
        store: Arc<S>,
        storage: Arc<dyn Storage>,
        processor: Arc<dyn ImageProcessor>,
        import_config: ImportConfig,
        export_config: ExportConfig,
    ) -> Self {
        Self {
            store,
            storage,
            processor,
            import_config,
            export_config,
        }
    }

    fn export_context(&self) -> ExportContext<'_> {
        ExportContext::new(self.store.as_ref(), self.storage.as_ref())
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Write the given templates as `<id>.json` documents
    #[instrument(skip(self, writer), fields(count = ids.len()))]
    pub async fn export_templates<W: ArchiveWriter>(&self, ids: &[Id], writer: &mut W) -> ArchiveResult<usize> {
        for id in ids {
            let template = self
                .store
                .find_template(*id)
                .await?
                .ok_or_else(|| ArchiveError::NotFound { entity: "FindingTemplate", id: id.to_string() })?;
            writer.add_json(&format!("{}.json", id), &TemplateDocument::export(&template))?;
        }

        info!(count = ids.len(), "Templates exported");
        Ok(ids.len())
    }

    /// Write the given project types with their assets
    #[instrument(skip(self, writer), fields(count = ids.len()))]
    pub async fn export_project_types<W: ArchiveWriter>(&self, ids: &[Id], writer: &mut W) -> ArchiveResult<usize> {
        let ctx = self.export_context();
        for id in ids {
            let project_type = self
                .store
                .find_project_type(*id)
                .await?
                .ok_or_else(|| ArchiveError::NotFound { entity: "ProjectType", id: id.to_string() })?;

            let document = ProjectTypeDocument::export(ctx, &project_type).await?;
            writer.add_json(&format!("{}.json", id), &document)?;
            let files = write_entries(writer, ProjectTypeDocument::export_files(ctx, &project_type).await?).await?;
            debug!(id = %id, files, "Project type written");
        }

        info!(count = ids.len(), "Project types exported");
        Ok(ids.len())
    }

    /// Write the given projects with their project types, assets and images
    #[instrument(skip(self, writer), fields(count = ids.len()))]
    pub async fn export_projects<W: ArchiveWriter>(&self, ids: &[Id], writer: &mut W) -> ArchiveResult<usize> {
        let ctx = self.export_context();
        for id in ids {
            let project = self
                .store
                .find_project(*id)
                .await?
                .ok_or_else(|| ArchiveError::NotFound { entity: "PentestProject", id: id.to_string() })?;

            let document = ProjectDocument::export(ctx, &project).await?;
            writer.add_json(&format!("{}.json", id), &document)?;
            let files = write_entries(writer, ProjectDocument::export_files(ctx, &project).await?).await?;
            debug!(id = %id, files, "Project written");
        }

        info!(count = ids.len(), "Projects exported");
        Ok(ids.len())
    }

    /// Export projects into a gzip compressed tar archive
    pub async fn export_projects_archive(&self, ids: &[Id]) -> ArchiveResult<Vec<u8>> {
        let mut writer = TarArchiveWriter::new(Vec::new(), &self.export_config);
        self.export_projects(ids, &mut writer).await?;
        writer.finish()
    }

    // ========================================================================
    // Import
    // ========================================================================

    #[instrument(skip(self, archive))]
    pub async fn import_templates(&self, archive: &dyn ArchiveReader) -> ArchiveResult<Vec<FindingTemplate>> {
        self.import_all::<TemplateDocument>(archive).await
    }

    #[instrument(skip(self, archive))]
    pub async fn import_project_types(&self, archive: &dyn ArchiveReader) -> ArchiveResult<Vec<ProjectType>> {
        self.import_all::<ProjectTypeDocument>(archive).await
    }

    #[instrument(skip(self, archive))]
    pub async fn import_projects(&self, archive: &dyn ArchiveReader) -> ArchiveResult<Vec<PentestProject>> {
        self.import_all::<ProjectDocument>(archive).await
    }

    /// Parse and check every document, then import them in one transaction
    async fn import_all<D: RootDocument>(&self, archive: &dyn ArchiveReader) -> ArchiveResult<Vec<D::Output>> {
        let mut documents = Vec::new();
        for (path, value) in archive.json_entries()? {
            let document: D = parse_document(value)
                .and_then(|document: D| document.check().map(|()| document))
                .inspect_err(|e| warn!(path = %path, error = %e, "Invalid document"))?;
            documents.push((path, document));
        }

        let tx = self.store.begin().await?;
        let mut ctx = ImportContext::new(
            &tx,
            archive,
            self.storage.as_ref(),
            self.processor.as_ref(),
            &self.import_config,
        );

        let mut created = Vec::with_capacity(documents.len());
        let mut failure = None;
        for (path, document) in documents {
            ctx.reset_bindings();
            match document.import(&mut ctx).await {
                Ok(entity) => created.push(entity),
                Err(e) => {
                    error!(path = %path, error = %e, "Import failed");
                    failure = Some(e);
                    break;
                }
            }
        }
        let stored_files = ctx.into_stored_files();

        let result = match failure {
            None => tx.commit().await.map_err(ArchiveError::from),
            Some(e) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        };

        if let Err(e) = result {
            let failed = delete_stored_files(self.storage.as_ref(), &stored_files).await;
            warn!(files = stored_files.len(), failed, "Discarded stored files of failed import");
            return Err(e);
        }

        info!(count = created.len(), files = stored_files.len(), "Import committed");
        Ok(created)
    }
}

/// Drain a file stream into the archive
async fn write_entries<W: ArchiveWriter>(writer: &mut W, mut entries: FileStream<'_>) -> ArchiveResult<usize> {
    let mut count = 0;
    while let Some(entry) = entries.next().await {
        let entry = entry?;
        writer.add_entry(&entry.path, &entry.content)?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryArchive;
    use rc_attachments::{MemoryStorage, PassthroughProcessor};
    use rc_core::traits::new_id;
    use rc_db::MemoryStore;
    use serde_json::json;

    fn service(store: Arc<MemoryStore>) -> ArchiveService<MemoryStore> {
        ArchiveService::new(
            store,
            Arc::new(MemoryStorage::new()),
            Arc::new(PassthroughProcessor),
            ImportConfig::default(),
            ExportConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_export_unknown_template() {
        let service = service(Arc::new(MemoryStore::new()));
        let mut archive = MemoryArchive::new();

        let result = service.export_templates(&[new_id()], &mut archive).await;
        assert!(matches!(result, Err(ArchiveError::NotFound { entity: "FindingTemplate", .. })));
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn test_templates_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let mut template = FindingTemplate::new("en-US");
        template.update_data(json!({"title": "SQLi"}).as_object().cloned().unwrap());
        store.insert_template(template.clone());

        let service = service(store.clone());
        let mut archive = MemoryArchive::new();
        service.export_templates(&[template.id], &mut archive).await.unwrap();
        assert!(archive.contains(&format!("{}.json", template.id)));

        let imported = service.import_templates(&archive).await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_ne!(imported[0].id, template.id);
        assert_eq!(imported[0].title, "SQLi");
        assert_eq!(store.snapshot().templates.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_document_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());

        let mut archive = MemoryArchive::new();
        let valid = json!({"format": "templates/v1", "tags": [], "language": "en-US", "status": "in-progress", "data": {}});
        let mut invalid = valid.clone();
        invalid["language"] = json!("not a language");
        archive.insert_json("a.json", &valid);
        archive.insert_json("b.json", &invalid);

        let err = service.import_templates(&archive).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.snapshot().templates.is_empty());
    }
}
