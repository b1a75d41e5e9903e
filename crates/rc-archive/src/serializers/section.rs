//! Report section entries of a project document
//!
//! Sections are created together with their project, so importing a
//! section only ever updates one of those rows.

use chrono::{DateTime, Utc};
use rc_models::ReportSection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ImportContext;
use crate::error::ArchiveResult;
use crate::fields::{resolve_user, user_ref, UserRef};

/// Exported section state; `id` is the section key of the project type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SectionDocument {
    pub fn export(section: &ReportSection) -> Self {
        Self {
            id: section.section_id.clone(),
            created: Some(section.created),
            updated: Some(section.updated),
            assignee: user_ref(section.assignee_id),
            status: Some(section.status.clone()),
        }
    }

    /// Apply the imported state to an existing section
    ///
    /// Fields without a value, including dropped assignees, leave the
    /// section unchanged.
    pub async fn update(&self, ctx: &ImportContext<'_>, section: &mut ReportSection) -> ArchiveResult<()> {
        let field = format!("sections.{}.assignee", self.id);
        let assignee = resolve_user(ctx.store, self.assignee.as_ref(), &field).await?;
        assignee.apply_to(&mut section.assignee_id);

        if let Some(status) = &self.status {
            section.status = status.clone();
        }
        if let Some(created) = self.created {
            section.created = created;
        }
        section.updated = self.updated.unwrap_or_else(Utc::now);
        Ok(())
    }
}

/// Update the sections of the bound project from the imported entries
///
/// Entries are matched by section id. Sections without an entry stay as
/// they are; entries without a section are ignored.
pub async fn update_sections(ctx: &ImportContext<'_>, documents: &[SectionDocument]) -> ArchiveResult<usize> {
    let project_id = ctx.project()?.entity.id;
    let sections = ctx.store.sections_for_project(project_id).await?;

    for document in documents {
        if !sections.iter().any(|s| s.section_id == document.id) {
            debug!(section_id = %document.id, "Ignoring entry for unknown section");
        }
    }

    let mut updated = 0;
    for mut section in sections {
        let Some(document) = documents.iter().find(|d| d.id == section.section_id) else {
            continue;
        };
        document.update(ctx, &mut section).await?;
        ctx.store.update_section(&section).await?;
        debug!(section_id = %section.section_id, status = %section.status, "Section updated");
        updated += 1;
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryArchive;
    use crate::serializers::parse_document;
    use rc_attachments::{MemoryStorage, PassthroughProcessor};
    use rc_core::config::ImportConfig;
    use rc_core::traits::new_id;
    use rc_core::types::review_status;
    use rc_db::{MemoryStore, ProjectRepository, ProjectTypeRepository, SectionRepository};
    use rc_models::{PentestProject, ProjectType, ReportSectionDefinition, User};
    use serde_json::json;

    #[tokio::test]
    async fn test_only_matching_sections_are_updated() {
        let store = MemoryStore::new();
        let user = User::new("jdoe");
        store.insert_user(user.clone());

        let mut project_type = ProjectType::new("Web", "en-US");
        project_type.report_sections = vec![
            ReportSectionDefinition::new("s1", vec![]),
            ReportSectionDefinition::new("s2", vec![]),
        ];
        let project_type = store.create_project_type(project_type).await.unwrap();
        let project = store
            .create_project(PentestProject::new("Acme", "en-US", project_type.id))
            .await
            .unwrap();

        let archive = MemoryArchive::new();
        let storage = MemoryStorage::new();
        let config = ImportConfig::default();
        let mut ctx = ImportContext::new(&store, &archive, &storage, &PassthroughProcessor, &config);
        ctx.bind_project(project.clone(), new_id());

        let documents: Vec<SectionDocument> = parse_document(json!([
            {"id": "s1", "status": "done", "assignee": {"id": user.id}},
            {"id": "s3", "status": "done"},
        ]))
        .unwrap();

        assert_eq!(update_sections(&ctx, &documents).await.unwrap(), 1);

        let sections = store.sections_for_project(project.id).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].status, "done");
        assert_eq!(sections[0].assignee_id, Some(user.id));
        assert_eq!(sections[1].status, review_status::IN_PROGRESS);
    }

    #[tokio::test]
    async fn test_unknown_assignee_keeps_current() {
        let store = MemoryStore::new();
        let archive = MemoryArchive::new();
        let storage = MemoryStorage::new();
        let config = ImportConfig::default();
        let ctx = ImportContext::new(&store, &archive, &storage, &PassthroughProcessor, &config);

        let existing = new_id();
        let mut section = ReportSection::new(new_id(), "s1");
        section.assignee_id = Some(existing);

        let doc: SectionDocument =
            parse_document(json!({"id": "s1", "assignee": {"id": new_id()}})).unwrap();
        doc.update(&ctx, &mut section).await.unwrap();

        assert_eq!(section.assignee_id, Some(existing));
        assert_eq!(section.status, review_status::IN_PROGRESS);
    }
}
