//! `projects/v1` documents
//!
//! A project document embeds its project type by value together with its
//! members, sections, findings and images. Import runs in two phases:
//! [`ProjectDocument::validate`] checks the whole document and resolves
//! its members, [`ValidatedProject::create`] then writes the project
//! graph parent first.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use rc_contracts::{Contract, DocumentData, ProjectImportContract};
use rc_core::error::ValidationErrors;
use rc_core::traits::Id;
use rc_core::types::Source;
use rc_db::Store;
use rc_models::{
    ensure_defined_structure, FileKind, HandleUndefined, ImportedMember, PentestProject,
    ProjectMemberInfo,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::files::{validate_files, FileDocument, FileEntrySerializer, FileStream};
use super::finding::{create_findings, FindingDocument};
use super::project_type::ProjectTypeDocument;
use super::section::{update_sections, SectionDocument};
use super::timestamps;
use crate::context::{ExportContext, ImportContext};
use crate::error::{ArchiveError, ArchiveResult};
use crate::fields::{partition_members, resolve_member, ResolvedMember};
use crate::format::{FormatTag, ProjectsV1};

/// Exported pentest project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub format: FormatTag<ProjectsV1>,
    /// Id in the source system; names the image directory in the archive
    pub id: Id,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<ImportedMember>>,
    /// Older name of `members`, read when `members` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pentesters: Option<Vec<ImportedMember>>,
    pub project_type: ProjectTypeDocument,
    pub report_data: Map<String, Value>,
    pub sections: Vec<SectionDocument>,
    pub findings: Vec<FindingDocument>,
    pub images: Vec<FileDocument>,
}

impl DocumentData for ProjectDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn language(&self) -> &str {
        &self.language
    }
}

/// Member snapshots of a stored project
///
/// Linked members are written with their current user data; members
/// imported without a local user are written as they were imported.
async fn export_members(store: &dyn Store, project: &PentestProject) -> ArchiveResult<Vec<ImportedMember>> {
    let mut members = Vec::new();
    for info in store.members_for_project(project.id).await? {
        match store.find_user(info.user_id).await? {
            Some(user) => members.push(ImportedMember::from_user(&user, info.roles)),
            None => warn!(user_id = %info.user_id, project_id = %project.id, "Skipping member without user"),
        }
    }
    members.extend(project.imported_members.iter().cloned());
    Ok(members)
}

impl ProjectDocument {
    pub async fn export(ctx: ExportContext<'_>, project: &PentestProject) -> ArchiveResult<Self> {
        let project_type = ctx
            .store
            .find_project_type(project.project_type_id)
            .await?
            .ok_or_else(|| ArchiveError::NotFound {
                entity: "ProjectType",
                id: project.project_type_id.to_string(),
            })?;

        let sections = ctx.store.sections_for_project(project.id).await?;
        let findings = ctx.store.findings_for_project(project.id).await?;
        let images = ctx.store.files_for(FileKind::Image, project.id).await?;

        Ok(Self {
            format: FormatTag::new(),
            id: project.id,
            created: Some(project.created),
            updated: Some(project.updated),
            name: project.name.clone(),
            language: project.language.clone(),
            members: Some(export_members(ctx.store, project).await?),
            pentesters: None,
            project_type: ProjectTypeDocument::export(ctx, &project_type).await?,
            report_data: project.data.clone(),
            sections: sections.iter().map(SectionDocument::export).collect(),
            findings: findings.iter().map(FindingDocument::export).collect(),
            images: images.iter().map(FileDocument::from_file).collect(),
        })
    }

    /// Asset entries of the project type followed by the project's images
    pub async fn export_files<'a>(
        ctx: ExportContext<'a>,
        project: &PentestProject,
    ) -> ArchiveResult<FileStream<'a>> {
        let project_type = ctx
            .store
            .find_project_type(project.project_type_id)
            .await?
            .ok_or_else(|| ArchiveError::NotFound {
                entity: "ProjectType",
                id: project.project_type_id.to_string(),
            })?;
        let assets = ProjectTypeDocument::export_files(ctx, &project_type).await?;

        let images = ctx.store.files_for(FileKind::Image, project.id).await?;
        let images = FileEntrySerializer::for_export(FileKind::Image, project.id)
            .export_entries(ctx.storage, images);

        Ok(assets.chain(images).boxed())
    }

    /// Collect every problem of the document by field path
    pub fn validation_errors(&self) -> ValidationErrors {
        let mut errors = match ProjectImportContract.validate(self) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        errors.merge_prefixed("project_type", self.project_type.validation_errors());
        validate_files("images", &self.images, &mut errors);
        errors
    }

    /// Check the document and resolve its members against the user directory
    pub async fn validate(self, store: &dyn Store) -> ArchiveResult<ValidatedProject> {
        self.validation_errors().into_result()?;

        let snapshots = self.members.or(self.pentesters).unwrap_or_default();
        let mut members = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            members.push(resolve_member(store, snapshot).await?);
        }

        Ok(ValidatedProject {
            correlation_id: self.id,
            created: self.created,
            updated: self.updated,
            name: self.name,
            language: self.language,
            members,
            project_type: self.project_type,
            report_data: self.report_data,
            sections: self.sections,
            findings: self.findings,
            images: self.images,
        })
    }
}

/// A checked project document, ready to be written
#[derive(Debug, Clone)]
pub struct ValidatedProject {
    pub correlation_id: Id,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub language: String,
    pub members: Vec<ResolvedMember>,
    pub project_type: ProjectTypeDocument,
    pub report_data: Map<String, Value>,
    pub sections: Vec<SectionDocument>,
    pub findings: Vec<FindingDocument>,
    pub images: Vec<FileDocument>,
}

impl ValidatedProject {
    /// Write the project graph
    ///
    /// The project type comes first as it is needed by the project, then
    /// the project, then everything that belongs to the project.
    #[instrument(skip(self, ctx), fields(name = %self.name, source_id = %self.correlation_id))]
    pub async fn create(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<PentestProject> {
        let mut project_type = self
            .project_type
            .create(ctx, Source::ImportedDependency)
            .await?;

        let (linked, detached) = partition_members(self.members);

        let mut project = PentestProject::new(self.name, self.language, project_type.id);
        project.source = Source::Imported;
        project.imported_members = detached;
        project.data = ensure_defined_structure(
            &self.report_data,
            &project_type.report_fields,
            HandleUndefined::FillNone,
            true,
        );
        (project.created, project.updated) = timestamps(self.created, self.updated);
        let project = ctx.store.create_project(project).await?;

        project_type.linked_project = Some(project.id);
        ctx.store.update_project_type(&project_type).await?;
        ctx.update_project_type(project_type)?;

        let member_infos: Vec<ProjectMemberInfo> = linked
            .into_iter()
            .map(|(user_id, roles)| ProjectMemberInfo::new(project.id, user_id, roles))
            .collect();
        if !member_infos.is_empty() {
            ctx.store.bulk_create_members(member_infos).await?;
        }

        ctx.bind_project(project.clone(), self.correlation_id);

        let sections = update_sections(ctx, &self.sections).await?;
        let findings = create_findings(ctx, self.findings).await?;
        let images = FileEntrySerializer::for_import(FileKind::Image, self.correlation_id)
            .create(ctx, "images", project.id, self.images)
            .await?;

        info!(
            id = %project.id,
            imported_members = project.imported_members.len(),
            sections,
            findings = findings.len(),
            images = images.len(),
            "Project imported"
        );
        Ok(project)
    }
}
