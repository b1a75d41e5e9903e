//! Repository traits
//!
//! One trait per entity, grouped into the [`Store`] seam that importers and
//! exporters work against. Stores that can group writes atomically also
//! implement [`TransactionalStore`].

use async_trait::async_trait;
use rc_core::error::RcError;
use rc_core::traits::Id;
use rc_models::{
    FileKind, FindingTemplate, PentestFinding, PentestProject, ProjectMemberInfo, ProjectType,
    ReportSection, UploadedFile, User,
};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: Id) -> Self {
        Self::NotFound(format!("{} {}", entity, id))
    }
}

impl From<RepositoryError> for RcError {
    fn from(err: RepositoryError) -> Self {
        RcError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User directory lookups
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Id) -> RepositoryResult<Option<User>>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_template(&self, id: Id) -> RepositoryResult<Option<FindingTemplate>>;

    async fn template_exists(&self, id: Id) -> RepositoryResult<bool> {
        Ok(self.find_template(id).await?.is_some())
    }

    async fn create_template(&self, template: FindingTemplate) -> RepositoryResult<FindingTemplate>;
}

#[async_trait]
pub trait ProjectTypeRepository: Send + Sync {
    async fn find_project_type(&self, id: Id) -> RepositoryResult<Option<ProjectType>>;

    async fn create_project_type(&self, project_type: ProjectType) -> RepositoryResult<ProjectType>;

    /// Persist changes to an existing project type
    async fn update_project_type(&self, project_type: &ProjectType) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_project(&self, id: Id) -> RepositoryResult<Option<PentestProject>>;

    /// Create a project together with one section per section definition
    /// of its project type
    async fn create_project(&self, project: PentestProject) -> RepositoryResult<PentestProject>;
}

#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// Sections of a project in project type definition order
    async fn sections_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ReportSection>>;

    async fn update_section(&self, section: &ReportSection) -> RepositoryResult<()>;
}

#[async_trait]
pub trait FindingRepository: Send + Sync {
    async fn findings_for_project(&self, project_id: Id) -> RepositoryResult<Vec<PentestFinding>>;

    async fn bulk_create_findings(
        &self,
        findings: Vec<PentestFinding>,
    ) -> RepositoryResult<Vec<PentestFinding>>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn members_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ProjectMemberInfo>>;

    async fn bulk_create_members(
        &self,
        members: Vec<ProjectMemberInfo>,
    ) -> RepositoryResult<Vec<ProjectMemberInfo>>;
}

/// Uploaded images and assets
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn files_for(&self, kind: FileKind, linked_object: Id) -> RepositoryResult<Vec<UploadedFile>>;

    async fn bulk_create_files(&self, files: Vec<UploadedFile>) -> RepositoryResult<Vec<UploadedFile>>;
}

/// Everything the archive layer reads and writes
pub trait Store:
    UserRepository
    + TemplateRepository
    + ProjectTypeRepository
    + ProjectRepository
    + SectionRepository
    + FindingRepository
    + MemberRepository
    + FileRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + TemplateRepository
        + ProjectTypeRepository
        + ProjectRepository
        + SectionRepository
        + FindingRepository
        + MemberRepository
        + FileRepository
{
}

/// A unit of work; dropping it without `commit` discards its writes
#[async_trait]
pub trait Transaction: Store + Sized {
    async fn commit(self) -> RepositoryResult<()>;

    async fn rollback(self) -> RepositoryResult<()>;
}

/// A store that can open transactions
#[async_trait]
pub trait TransactionalStore: Store {
    type Tx: Transaction;

    async fn begin(&self) -> RepositoryResult<Self::Tx>;
}
