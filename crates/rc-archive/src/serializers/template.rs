//! `templates/v1` documents

use chrono::{DateTime, Utc};
use rc_contracts::TemplateImportContract;
use rc_core::traits::Id;
use rc_core::types::Source;
use rc_models::FindingTemplate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::timestamps;
use crate::context::ImportContext;
use crate::error::ArchiveResult;
use crate::format::{FormatTag, TemplatesV1};

/// Exported finding template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub format: FormatTag<TemplatesV1>,
    /// Exported for reference; imported templates get a new id
    #[serde(default, skip_deserializing)]
    pub id: Option<Id>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub language: String,
    pub status: String,
    pub data: Map<String, Value>,
}

impl TemplateDocument {
    pub fn export(template: &FindingTemplate) -> Self {
        Self {
            format: FormatTag::new(),
            id: Some(template.id),
            created: Some(template.created),
            updated: Some(template.updated),
            tags: template.tags.clone(),
            language: template.language.clone(),
            status: template.status.clone(),
            data: template.data.clone(),
        }
    }

    pub fn validate(&self) -> ArchiveResult<()> {
        TemplateImportContract.validate_language(&self.language)?;
        Ok(())
    }

    /// Create a new template marked as imported
    #[instrument(skip(self, ctx), fields(language = %self.language))]
    pub async fn create(self, ctx: &mut ImportContext<'_>) -> ArchiveResult<FindingTemplate> {
        self.validate()?;

        let mut template = FindingTemplate::new(self.language);
        template.tags = self.tags;
        template.status = self.status;
        template.source = Source::Imported;
        (template.created, template.updated) = timestamps(self.created, self.updated);
        template.update_data(self.data);

        let template = ctx.store.create_template(template).await?;
        info!(id = %template.id, title = %template.title, "Template imported");
        Ok(template)
    }
}
