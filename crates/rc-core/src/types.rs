//! Common types used throughout ReportCreator RS

use serde::{Deserialize, Serialize};

/// Where an entity came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Created interactively in this system
    #[default]
    Created,
    /// Copied and modified from another entity
    Customized,
    /// Imported directly by a user
    Imported,
    /// Imported as a by-value dependency of another imported entity
    ImportedDependency,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Customized => "customized",
            Self::Imported => "imported",
            Self::ImportedDependency => "imported_dependency",
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported | Self::ImportedDependency)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review status values used by findings, sections and templates.
///
/// Statuses are carried as plain strings so that documents from systems
/// with custom workflows survive a round trip.
pub mod review_status {
    pub const IN_PROGRESS: &str = "in-progress";
    pub const READY_FOR_REVIEW: &str = "ready-for-review";
    pub const NEEDS_IMPROVEMENT: &str = "needs-improvement";
    pub const FINISHED: &str = "finished";
    pub const DEPRECATED: &str = "deprecated";

    pub fn default_status() -> String {
        IN_PROGRESS.to_string()
    }
}
