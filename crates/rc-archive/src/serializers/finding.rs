//! Finding entries of a project document

use chrono::{DateTime, Utc};
use rc_core::traits::Id;
use rc_core::types::review_status;
use rc_models::{ensure_defined_structure, HandleUndefined, PentestFinding};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::timestamps;
use crate::context::ImportContext;
use crate::error::ArchiveResult;
use crate::fields::{resolve_template, resolve_user, user_ref, UserRef};

/// Exported finding; `id` is the finding id shared across systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingDocument {
    pub id: Id,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default = "review_status::default_status")]
    pub status: String,
    #[serde(default)]
    pub template: Option<Id>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl FindingDocument {
    pub fn export(finding: &PentestFinding) -> Self {
        Self {
            id: finding.finding_id,
            created: Some(finding.created),
            updated: Some(finding.updated),
            assignee: user_ref(finding.assignee_id),
            status: finding.status.clone(),
            template: finding.template_id,
            data: finding.data.clone(),
        }
    }

    /// Build the finding for the project bound in the context
    ///
    /// Dangling assignee and template references are dropped. The data is
    /// shaped after the project type's finding fields; fields it does not
    /// define are kept.
    pub async fn build(self, ctx: &ImportContext<'_>, index: usize) -> ArchiveResult<PentestFinding> {
        let project = &ctx.project()?.entity;
        let project_type = &ctx.project_type()?.entity;

        let assignee = resolve_user(ctx.store, self.assignee.as_ref(), &format!("findings[{}].assignee", index)).await?;
        let template = resolve_template(ctx.store, self.template, &format!("findings[{}].template", index)).await?;

        let mut finding = PentestFinding::new(project.id);
        finding.finding_id = self.id;
        finding.status = self.status;
        finding.assignee_id = assignee.into_option();
        finding.template_id = template.into_option();
        (finding.created, finding.updated) = timestamps(self.created, self.updated);
        finding.update_data(ensure_defined_structure(
            &self.data,
            &project_type.finding_fields,
            HandleUndefined::FillNone,
            true,
        ));

        Ok(finding)
    }
}

/// Create all findings of the bound project in one batch
pub async fn create_findings(
    ctx: &ImportContext<'_>,
    documents: Vec<FindingDocument>,
) -> ArchiveResult<Vec<PentestFinding>> {
    let mut findings = Vec::with_capacity(documents.len());
    for (idx, document) in documents.into_iter().enumerate() {
        findings.push(document.build(ctx, idx).await?);
    }

    debug!(count = findings.len(), "Creating findings");
    if findings.is_empty() {
        return Ok(findings);
    }
    Ok(ctx.store.bulk_create_findings(findings).await?)
}
