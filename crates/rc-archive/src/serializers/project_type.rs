//! `projecttypes/v1` documents

use chrono::{DateTime, Utc};
use rc_contracts::{Contract, DocumentData, ProjectTypeData, ProjectTypeImportContract};
use rc_core::error::ValidationErrors;
use rc_core::traits::Id;
use rc_core::types::Source;
use rc_models::{FieldDefinitions, FileKind, ProjectType, ReportSectionDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::files::{validate_files, FileDocument, FileEntrySerializer, FileStream};
use super::timestamps;
use crate::context::{ExportContext, ImportContext};
use crate::error::ArchiveResult;
use crate::format::{FormatTag, ProjectTypesV1};

/// Exported project type with its assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTypeDocument {
    pub format: FormatTag<ProjectTypesV1>,
    /// Id in the source system; names the asset directory in the archive
    pub id: Id,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    pub language: String,
    pub report_fields: FieldDefinitions,
    pub report_sections: Vec<ReportSectionDefinition>,
    pub finding_fields: FieldDefinitions,
    pub finding_field_order: Vec<String>,
    pub report_template: String,
    pub report_styles: String,
    pub report_preview_data: Map<String, Value>,
    pub assets: Vec<FileDocument>,
}

impl DocumentData for ProjectTypeDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn language(&self) -> &str {
        &self.language
    }
}

impl ProjectTypeData for ProjectTypeDocument {
    fn section_ids(&self) -> Vec<&str> {
        self.report_sections.iter().map(|s| s.id.as_str()).collect()
    }
}

impl ProjectTypeDocument {
    pub async fn export(ctx: ExportContext<'_>, project_type: &ProjectType) -> ArchiveResult<Self> {
        let assets = ctx.store.files_for(FileKind::Asset, project_type.id).await?;

        Ok(Self {
            format: FormatTag::new(),
            id: project_type.id,
            created: Some(project_type.created),
            updated: Some(project_type.updated),
            name: project_type.name.clone(),
            language: project_type.language.clone(),
            report_fields: project_type.report_fields.clone(),
            report_sections: project_type.report_sections.clone(),
            finding_fields: project_type.finding_fields.clone(),
            finding_field_order: project_type.finding_field_order.clone(),
            report_template: project_type.report_template.clone(),
            report_styles: project_type.report_styles.clone(),
            report_preview_data: project_type.report_preview_data.clone(),
            assets: assets.iter().map(FileDocument::from_file).collect(),
        })
    }

    /// Asset entries of a stored project type
    pub async fn export_files<'a>(
        ctx: ExportContext<'a>,
        project_type: &ProjectType,
    ) -> ArchiveResult<FileStream<'a>> {
        let assets = ctx.store.files_for(FileKind::Asset, project_type.id).await?;
        let serializer = FileEntrySerializer::for_export(FileKind::Asset, project_type.id);
        Ok(serializer.export_entries(ctx.storage, assets))
    }

    /// Collect every problem of the document, asset names included
    pub fn validation_errors(&self) -> ValidationErrors {
        let mut errors = match ProjectTypeImportContract.validate(self) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        validate_files("assets", &self.assets, &mut errors);
        errors
    }

    pub fn validate(&self) -> ArchiveResult<()> {
        Ok(self.validation_errors().into_result()?)
    }

    /// Create the project type and its assets
    ///
    /// The document id is not reused; it stays bound in the context as the
    /// correlation id of the asset directory.
    #[instrument(skip(self, ctx), fields(name = %self.name, source = %source))]
    pub async fn create(self, ctx: &mut ImportContext<'_>, source: Source) -> ArchiveResult<ProjectType> {
        self.validate()?;

        let correlation_id = self.id;
        let mut project_type = ProjectType::new(self.name, self.language);
        project_type.report_fields = self.report_fields;
        project_type.report_sections = self.report_sections;
        project_type.finding_fields = self.finding_fields;
        project_type.finding_field_order = self.finding_field_order;
        project_type.report_template = self.report_template;
        project_type.report_styles = self.report_styles;
        project_type.report_preview_data = self.report_preview_data;
        project_type.source = source;
        (project_type.created, project_type.updated) = timestamps(self.created, self.updated);

        let project_type = ctx.store.create_project_type(project_type).await?;
        ctx.bind_project_type(project_type.clone(), correlation_id);

        let assets = FileEntrySerializer::for_import(FileKind::Asset, correlation_id)
            .create(ctx, "assets", project_type.id, self.assets)
            .await?;

        info!(id = %project_type.id, assets = assets.len(), "Project type imported");
        Ok(project_type)
    }
}
