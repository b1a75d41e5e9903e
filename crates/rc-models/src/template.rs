//! Finding template model
//!
//! Table: finding_templates

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, Timestamped};
use rc_core::types::{review_status, Source};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reusable finding template
///
/// The data map is self-describing; it is not validated against any
/// project type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingTemplate {
    pub id: Id,

    #[serde(default)]
    pub tags: Vec<String>,

    pub language: String,

    pub status: String,

    #[serde(default)]
    pub source: Source,

    /// Display title, derived from `data.title`
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub data: Map<String, Value>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl FindingTemplate {
    pub fn new(language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            tags: Vec::new(),
            language: language.into(),
            status: review_status::default_status(),
            source: Source::Created,
            title: String::new(),
            data: Map::new(),
            created: now,
            updated: now,
        }
    }

    /// Replace the template data and refresh the derived title
    pub fn update_data(&mut self, data: Map<String, Value>) {
        self.title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.data = data;
    }
}

impl Identifiable for FindingTemplate {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for FindingTemplate {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Entity for FindingTemplate {
    const TABLE_NAME: &'static str = "finding_templates";
    const TYPE_NAME: &'static str = "FindingTemplate";
}
