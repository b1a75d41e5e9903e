//! Project type (report design) model
//!
//! Table: project_types

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, Timestamped};
use rc_core::types::Source;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::fields::FieldDefinitions;

/// A report section as defined by the project type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSectionDefinition {
    /// Section key, unique within the project type
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Ids of the report fields rendered in this section
    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReportSectionDefinition {
    pub fn new(id: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            fields,
            extra: Map::new(),
        }
    }
}

/// Project type entity
///
/// Carries the field definitions that report and finding data must
/// conform to, plus the rendering template and styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProjectType {
    pub id: Id,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 16))]
    pub language: String,

    #[serde(default)]
    pub report_fields: FieldDefinitions,

    #[serde(default)]
    pub report_sections: Vec<ReportSectionDefinition>,

    #[serde(default)]
    pub finding_fields: FieldDefinitions,

    #[serde(default)]
    pub finding_field_order: Vec<String>,

    #[serde(default)]
    pub report_template: String,

    #[serde(default)]
    pub report_styles: String,

    #[serde(default)]
    pub report_preview_data: Map<String, Value>,

    #[serde(default)]
    pub source: Source,

    /// Project owning this type; set for types that were imported as
    /// part of a project
    #[serde(default)]
    pub linked_project: Option<Id>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ProjectType {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            language: language.into(),
            report_fields: FieldDefinitions::new(),
            report_sections: Vec::new(),
            finding_fields: FieldDefinitions::new(),
            finding_field_order: Vec::new(),
            report_template: String::new(),
            report_styles: String::new(),
            report_preview_data: Map::new(),
            source: Source::Created,
            linked_project: None,
            created: now,
            updated: now,
        }
    }

    /// Section ids in definition order
    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.report_sections.iter().map(|s| s.id.as_str())
    }
}

impl Identifiable for ProjectType {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for ProjectType {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Entity for ProjectType {
    const TABLE_NAME: &'static str = "project_types";
    const TYPE_NAME: &'static str = "ProjectType";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_type() {
        let mut pt = ProjectType::new("Web Pentest", "en-US");
        pt.report_sections = vec![
            ReportSectionDefinition::new("executive_summary", vec!["summary".into()]),
            ReportSectionDefinition::new("scope", vec![]),
        ];

        assert_eq!(pt.source, Source::Created);
        assert!(pt.linked_project.is_none());
        assert_eq!(pt.section_ids().collect::<Vec<_>>(), vec!["executive_summary", "scope"]);
    }

    #[test]
    fn test_validation() {
        let pt = ProjectType::new("", "en-US");
        assert!(pt.validate().is_err());
    }
}
