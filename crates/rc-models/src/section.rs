//! Report section model
//!
//! Table: report_sections

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, ProjectScoped, Timestamped};
use rc_core::types::review_status;
use serde::{Deserialize, Serialize};

/// Per-project state of a section defined by the project type.
///
/// Rows are instantiated when the project is created, one per
/// `report_sections` entry, and only updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: Id,

    pub project_id: Id,

    /// Key of the section definition in the project type
    pub section_id: String,

    pub status: String,

    pub assignee_id: Option<Id>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ReportSection {
    pub fn new(project_id: Id, section_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            project_id,
            section_id: section_id.into(),
            status: review_status::default_status(),
            assignee_id: None,
            created: now,
            updated: now,
        }
    }
}

impl Identifiable for ReportSection {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for ReportSection {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl ProjectScoped for ReportSection {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for ReportSection {
    const TABLE_NAME: &'static str = "report_sections";
    const TYPE_NAME: &'static str = "ReportSection";
}
