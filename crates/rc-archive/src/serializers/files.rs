//! Uploaded image and asset entries

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use rc_attachments::{generate_key, is_image, Storage, StoredFile};
use rc_contracts::FileNameContract;
use rc_core::error::ValidationErrors;
use rc_core::traits::Id;
use rc_models::{FileKind, UploadedFile};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::timestamps;
use crate::context::ImportContext;
use crate::error::{ArchiveError, ArchiveResult};

/// An archive path and the content stored under it
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: Bytes,
}

/// Lazily produced archive entries
pub type FileStream<'a> = BoxStream<'a, ArchiveResult<ArchiveEntry>>;

/// Document form of an uploaded file; the content lives in the archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDocument {
    /// Exported for reference only
    #[serde(default, skip_deserializing)]
    pub id: Option<Id>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
}

impl FileDocument {
    pub fn from_file(file: &UploadedFile) -> Self {
        Self {
            id: Some(file.id),
            created: Some(file.created),
            updated: Some(file.updated),
            name: file.name.clone(),
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        FileNameContract::new().validate_name(&self.name, &mut errors);
        errors
    }
}

/// Validate a file collection, keying errors as `<field>[<index>].name`
pub fn validate_files(field: &str, files: &[FileDocument], errors: &mut ValidationErrors) {
    for (idx, file) in files.iter().enumerate() {
        errors.merge_prefixed(&format!("{}[{}]", field, idx), file.validate());
    }
}

/// Maps files of one parent to and from archive paths
///
/// The directory is named after the parent's id: the live id on export,
/// the id from the archive on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntrySerializer {
    kind: FileKind,
    parent_key: Id,
}

impl FileEntrySerializer {
    /// Bind to a stored parent
    pub fn for_export(kind: FileKind, parent_id: Id) -> Self {
        Self { kind, parent_key: parent_id }
    }

    /// Bind to the id a parent had in the archive
    pub fn for_import(kind: FileKind, correlation_id: Id) -> Self {
        Self { kind, parent_key: correlation_id }
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn path_in_archive(&self, name: &str) -> String {
        format!("{}-{}/{}", self.parent_key, self.kind.plural(), name)
    }

    /// One entry per file, content loaded from storage on demand
    pub fn export_entries<'a>(&self, storage: &'a dyn Storage, files: Vec<UploadedFile>) -> FileStream<'a> {
        let serializer = *self;
        stream::iter(files)
            .then(move |file| async move {
                let content = storage.get(&file.storage_key).await?;
                Ok::<_, ArchiveError>(ArchiveEntry {
                    path: serializer.path_in_archive(&file.name),
                    content,
                })
            })
            .boxed()
    }

    /// Load file content for `name` from the archive
    fn extract_file(&self, ctx: &ImportContext<'_>, field: &str, name: &str) -> ArchiveResult<Bytes> {
        let path = self.path_in_archive(name);
        let data = ctx.archive.extract_file(&path)?;

        let max = ctx.config.max_file_size_bytes;
        if data.len() as u64 > max {
            return Err(ValidationErrors::single(
                field,
                format!("File too large: {} ({} bytes, maximum {} bytes)", path, data.len(), max),
            )
            .into());
        }

        if ctx.config.compress_images && is_image(name) {
            Ok(ctx.processor.process(name, data)?)
        } else {
            Ok(data)
        }
    }

    /// Create all files of a collection bound to `linked_object`
    ///
    /// Content is written to storage first and every written file is
    /// recorded in the context; the rows are then inserted in one batch.
    pub async fn create(
        &self,
        ctx: &mut ImportContext<'_>,
        field: &str,
        linked_object: Id,
        documents: Vec<FileDocument>,
    ) -> ArchiveResult<Vec<UploadedFile>> {
        let mut files = Vec::with_capacity(documents.len());

        for (idx, document) in documents.into_iter().enumerate() {
            let data = self.extract_file(ctx, &format!("{}[{}]", field, idx), &document.name)?;

            let key = generate_key(&format!("uploaded{}", self.kind.plural()), &document.name);
            let metadata = ctx.storage.put(&key, data).await?;
            debug!(name = %document.name, key = %key, size = metadata.size, kind = %self.kind, "File extracted");

            let mut file = UploadedFile::new(self.kind, linked_object, document.name, key.clone(), metadata.size);
            (file.created, file.updated) = timestamps(document.created, document.updated);

            ctx.record_stored_file(StoredFile { key, metadata });
            files.push(file);
        }

        if files.is_empty() {
            return Ok(files);
        }
        Ok(ctx.store.bulk_create_files(files).await?)
    }
}
