//! In-memory store
//!
//! All rows live in one [`StoreState`]. A transaction works on a private
//! copy of the state and swaps it in on commit; transactions are
//! serialized, so a commit never overwrites another transaction's writes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rc_core::traits::Id;
use rc_models::{
    FileKind, FindingTemplate, PentestFinding, PentestProject, ProjectMemberInfo, ProjectType,
    ReportSection, UploadedFile, User,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use validator::Validate;

use crate::repository::*;

/// All rows of the in-memory store
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub users: HashMap<Id, User>,
    pub templates: HashMap<Id, FindingTemplate>,
    pub project_types: HashMap<Id, ProjectType>,
    pub projects: HashMap<Id, PentestProject>,
    pub sections: Vec<ReportSection>,
    pub findings: Vec<PentestFinding>,
    pub members: Vec<ProjectMemberInfo>,
    pub files: Vec<UploadedFile>,
}

/// Access to a [`StoreState`]; every repository trait is implemented on
/// top of it
pub trait StateAccess: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R;

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R;
}

/// In-memory store with serialized transactions
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
    tx_lock: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.write(|state| {
            state.users.insert(user.id, user);
        });
    }

    pub fn insert_template(&self, template: FindingTemplate) {
        self.write(|state| {
            state.templates.insert(template.id, template);
        });
    }

    pub fn insert_project_type(&self, project_type: ProjectType) {
        self.write(|state| {
            state.project_types.insert(project_type.id, project_type);
        });
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }
}

impl StateAccess for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        f(&mut self.state.write())
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> RepositoryResult<MemoryTransaction> {
        let guard = self.tx_lock.clone().lock_owned().await;
        let staged = self.state.read().clone();
        debug!("Transaction started");
        Ok(MemoryTransaction {
            committed: self.state.clone(),
            staged: RwLock::new(staged),
            _guard: guard,
        })
    }
}

/// Open transaction on a [`MemoryStore`]
pub struct MemoryTransaction {
    committed: Arc<RwLock<StoreState>>,
    staged: RwLock<StoreState>,
    _guard: OwnedMutexGuard<()>,
}

impl StateAccess for MemoryTransaction {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.staged.read())
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        f(&mut self.staged.write())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self) -> RepositoryResult<()> {
        let staged = self.staged.into_inner();
        *self.committed.write() = staged;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> RepositoryResult<()> {
        debug!("Transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl<T: StateAccess> UserRepository for T {
    async fn find_user(&self, id: Id) -> RepositoryResult<Option<User>> {
        Ok(self.read(|state| state.users.get(&id).cloned()))
    }
}

#[async_trait]
impl<T: StateAccess> TemplateRepository for T {
    async fn find_template(&self, id: Id) -> RepositoryResult<Option<FindingTemplate>> {
        Ok(self.read(|state| state.templates.get(&id).cloned()))
    }

    async fn create_template(&self, template: FindingTemplate) -> RepositoryResult<FindingTemplate> {
        self.write(|state| {
            if state.templates.contains_key(&template.id) {
                return Err(RepositoryError::Conflict(format!("FindingTemplate {}", template.id)));
            }
            state.templates.insert(template.id, template.clone());
            Ok(template)
        })
    }
}

#[async_trait]
impl<T: StateAccess> ProjectTypeRepository for T {
    async fn find_project_type(&self, id: Id) -> RepositoryResult<Option<ProjectType>> {
        Ok(self.read(|state| state.project_types.get(&id).cloned()))
    }

    async fn create_project_type(&self, project_type: ProjectType) -> RepositoryResult<ProjectType> {
        project_type
            .validate()
            .map_err(|e| RepositoryError::Validation(e.to_string()))?;
        self.write(|state| {
            if state.project_types.contains_key(&project_type.id) {
                return Err(RepositoryError::Conflict(format!("ProjectType {}", project_type.id)));
            }
            state.project_types.insert(project_type.id, project_type.clone());
            Ok(project_type)
        })
    }

    async fn update_project_type(&self, project_type: &ProjectType) -> RepositoryResult<()> {
        self.write(|state| match state.project_types.get_mut(&project_type.id) {
            Some(existing) => {
                *existing = project_type.clone();
                Ok(())
            }
            None => Err(RepositoryError::not_found("ProjectType", project_type.id)),
        })
    }
}

#[async_trait]
impl<T: StateAccess> ProjectRepository for T {
    async fn find_project(&self, id: Id) -> RepositoryResult<Option<PentestProject>> {
        Ok(self.read(|state| state.projects.get(&id).cloned()))
    }

    async fn create_project(&self, project: PentestProject) -> RepositoryResult<PentestProject> {
        project
            .validate()
            .map_err(|e| RepositoryError::Validation(e.to_string()))?;
        self.write(|state| {
            if state.projects.contains_key(&project.id) {
                return Err(RepositoryError::Conflict(format!("PentestProject {}", project.id)));
            }
            let project_type = state
                .project_types
                .get(&project.project_type_id)
                .ok_or_else(|| RepositoryError::not_found("ProjectType", project.project_type_id))?;

            let sections: Vec<ReportSection> = project_type
                .section_ids()
                .map(|section_id| ReportSection::new(project.id, section_id))
                .collect();

            state.sections.extend(sections);
            state.projects.insert(project.id, project.clone());
            Ok(project)
        })
    }
}

#[async_trait]
impl<T: StateAccess> SectionRepository for T {
    async fn sections_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ReportSection>> {
        Ok(self.read(|state| {
            state
                .sections
                .iter()
                .filter(|s| s.project_id == project_id)
                .cloned()
                .collect()
        }))
    }

    async fn update_section(&self, section: &ReportSection) -> RepositoryResult<()> {
        self.write(|state| {
            match state.sections.iter_mut().find(|s| s.id == section.id) {
                Some(existing) => {
                    *existing = section.clone();
                    Ok(())
                }
                None => Err(RepositoryError::not_found("ReportSection", section.id)),
            }
        })
    }
}

#[async_trait]
impl<T: StateAccess> FindingRepository for T {
    async fn findings_for_project(&self, project_id: Id) -> RepositoryResult<Vec<PentestFinding>> {
        Ok(self.read(|state| {
            state
                .findings
                .iter()
                .filter(|f| f.project_id == project_id)
                .cloned()
                .collect()
        }))
    }

    async fn bulk_create_findings(
        &self,
        findings: Vec<PentestFinding>,
    ) -> RepositoryResult<Vec<PentestFinding>> {
        self.write(|state| {
            for finding in &findings {
                if !state.projects.contains_key(&finding.project_id) {
                    return Err(RepositoryError::not_found("PentestProject", finding.project_id));
                }
            }
            state.findings.extend(findings.iter().cloned());
            Ok(findings)
        })
    }
}

#[async_trait]
impl<T: StateAccess> MemberRepository for T {
    async fn members_for_project(&self, project_id: Id) -> RepositoryResult<Vec<ProjectMemberInfo>> {
        Ok(self.read(|state| {
            state
                .members
                .iter()
                .filter(|m| m.project_id == project_id)
                .cloned()
                .collect()
        }))
    }

    async fn bulk_create_members(
        &self,
        members: Vec<ProjectMemberInfo>,
    ) -> RepositoryResult<Vec<ProjectMemberInfo>> {
        self.write(|state| {
            for member in &members {
                if !state.users.contains_key(&member.user_id) {
                    return Err(RepositoryError::not_found("User", member.user_id));
                }
                if !state.projects.contains_key(&member.project_id) {
                    return Err(RepositoryError::not_found("PentestProject", member.project_id));
                }
            }
            state.members.extend(members.iter().cloned());
            Ok(members)
        })
    }
}

#[async_trait]
impl<T: StateAccess> FileRepository for T {
    async fn files_for(&self, kind: FileKind, linked_object: Id) -> RepositoryResult<Vec<UploadedFile>> {
        Ok(self.read(|state| {
            state
                .files
                .iter()
                .filter(|f| f.is_linked_to(kind, linked_object))
                .cloned()
                .collect()
        }))
    }

    async fn bulk_create_files(&self, files: Vec<UploadedFile>) -> RepositoryResult<Vec<UploadedFile>> {
        self.write(|state| {
            for file in &files {
                let owner_exists = match file.kind {
                    FileKind::Image => state.projects.contains_key(&file.linked_object),
                    FileKind::Asset => state.project_types.contains_key(&file.linked_object),
                };
                if !owner_exists {
                    return Err(RepositoryError::not_found(file.kind.owner_type(), file.linked_object));
                }
            }
            state.files.extend(files.iter().cloned());
            Ok(files)
        })
    }
}
