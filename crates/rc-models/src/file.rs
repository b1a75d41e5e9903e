//! Uploaded file models
//!
//! Tables: uploaded_images, uploaded_assets

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};

/// Kind of uploaded file, which also determines the owning entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Image embedded in a project's report or findings; owned by a project
    Image,
    /// Asset used by a report template (fonts, logos); owned by a project type
    Asset,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Asset => "asset",
        }
    }

    /// Plural name used for archive directories and logging
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Asset => "assets",
        }
    }

    /// Type name of the owning entity
    pub fn owner_type(&self) -> &'static str {
        match self {
            Self::Image => "PentestProject",
            Self::Asset => "ProjectType",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An uploaded image or asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Id,
    pub kind: FileKind,
    /// Project (images) or project type (assets) owning the file
    pub linked_object: Id,
    /// File name as referenced from report content
    pub name: String,
    /// Key of the content in file storage
    pub storage_key: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl UploadedFile {
    pub fn new(
        kind: FileKind,
        linked_object: Id,
        name: impl Into<String>,
        storage_key: impl Into<String>,
        size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            kind,
            linked_object,
            name: name.into(),
            storage_key: storage_key.into(),
            size,
            created: now,
            updated: now,
        }
    }

    /// Check if this file belongs to the given owner
    pub fn is_linked_to(&self, kind: FileKind, linked_object: Id) -> bool {
        self.kind == kind && self.linked_object == linked_object
    }
}

impl Identifiable for UploadedFile {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for UploadedFile {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Entity for UploadedFile {
    const TABLE_NAME: &'static str = "uploaded_files";
    const TYPE_NAME: &'static str = "UploadedFile";
}
