//! Pentest project model
//!
//! Table: pentest_projects

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, Timestamped};
use rc_core::types::Source;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::member::ImportedMember;

/// Pentest project entity
///
/// Owns its sections, findings, members and uploaded images. The report
/// data is an open map validated against the project type's report fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PentestProject {
    pub id: Id,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 16))]
    pub language: String,

    pub project_type_id: Id,

    #[serde(default)]
    pub source: Source,

    /// Members without a local user account
    #[serde(default)]
    pub imported_members: Vec<ImportedMember>,

    /// Report field values
    #[serde(default)]
    pub data: Map<String, Value>,

    #[serde(default)]
    pub readonly: bool,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl PentestProject {
    pub fn new(name: impl Into<String>, language: impl Into<String>, project_type_id: Id) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            language: language.into(),
            project_type_id,
            source: Source::Created,
            imported_members: Vec::new(),
            data: Map::new(),
            readonly: false,
            created: now,
            updated: now,
        }
    }
}

impl Identifiable for PentestProject {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for PentestProject {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Entity for PentestProject {
    const TABLE_NAME: &'static str = "pentest_projects";
    const TYPE_NAME: &'static str = "PentestProject";
}
