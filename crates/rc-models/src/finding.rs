//! Pentest finding model
//!
//! Table: pentest_findings

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, ProjectScoped, Timestamped};
use rc_core::types::review_status;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pentest finding entity
///
/// `finding_id` is the stable identifier shared across systems; `id` is
/// the local primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PentestFinding {
    pub id: Id,

    pub finding_id: Id,

    pub project_id: Id,

    pub status: String,

    pub assignee_id: Option<Id>,

    /// Template this finding was created from
    pub template_id: Option<Id>,

    /// Finding field values
    #[serde(default)]
    pub data: Map<String, Value>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl PentestFinding {
    pub fn new(project_id: Id) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            finding_id: new_id(),
            project_id,
            status: review_status::default_status(),
            assignee_id: None,
            template_id: None,
            data: Map::new(),
            created: now,
            updated: now,
        }
    }

    /// Replace the finding data
    pub fn update_data(&mut self, data: Map<String, Value>) {
        self.data = data;
    }

    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }
}

impl Identifiable for PentestFinding {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for PentestFinding {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl ProjectScoped for PentestFinding {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for PentestFinding {
    const TABLE_NAME: &'static str = "pentest_findings";
    const TYPE_NAME: &'static str = "PentestFinding";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_finding_has_distinct_ids() {
        let finding = PentestFinding::new(new_id());
        assert_ne!(finding.id, finding.finding_id);
        assert_eq!(finding.status, review_status::IN_PROGRESS);
    }

    #[test]
    fn test_title_from_data() {
        let mut finding = PentestFinding::new(new_id());
        finding.update_data(json!({"title": "XSS"}).as_object().cloned().unwrap());
        assert_eq!(finding.title(), Some("XSS"));
    }
}
