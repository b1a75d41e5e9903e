//! Project membership models
//!
//! Table: project_member_info
//!
//! A project member is either linked to a local [`User`](crate::User)
//! through a [`ProjectMemberInfo`] row, or kept as a detached
//! [`ImportedMember`] snapshot on the project when the user does not
//! exist in this system.

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, ProjectScoped, Timestamped};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::user::User;

/// Membership of a local user in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMemberInfo {
    pub id: Id,

    pub project_id: Id,

    pub user_id: Id,

    /// Roles of the user in this project (e.g. "pentester", "reviewer")
    #[serde(default)]
    pub roles: Vec<String>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl ProjectMemberInfo {
    pub fn new(project_id: Id, user_id: Id, roles: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            project_id,
            user_id,
            roles,
            created: now,
            updated: now,
        }
    }
}

impl Identifiable for ProjectMemberInfo {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for ProjectMemberInfo {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl ProjectScoped for ProjectMemberInfo {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for ProjectMemberInfo {
    const TABLE_NAME: &'static str = "project_member_info";
    const TYPE_NAME: &'static str = "ProjectMemberInfo";
}

/// Snapshot of a member's name and contact data
///
/// Stored on projects for members whose user does not exist locally, and
/// used as the archive representation of every member. Keys this struct
/// does not know are kept in `extra` so a snapshot survives unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedMember {
    #[serde(default)]
    pub id: Option<Id>,

    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,

    /// Display name as rendered by the source system
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title_before: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub title_after: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImportedMember {
    /// Snapshot of a local user with the given project roles
    pub fn from_user(user: &User, roles: Vec<String>) -> Self {
        Self {
            id: Some(user.id),
            email: user.email.clone(),
            phone: user.phone.clone(),
            mobile: user.mobile.clone(),
            name: Some(user.name()),
            title_before: user.title_before.clone(),
            first_name: user.first_name.clone(),
            middle_name: user.middle_name.clone(),
            last_name: user.last_name.clone(),
            title_after: user.title_after.clone(),
            roles,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_member_for_project() {
        let user = User::new("jdoe");
        let project_id = new_id();
        let member = ProjectMemberInfo::new(project_id, user.id, vec!["lead".into()]);

        assert_eq!(member.project_id(), project_id);
        assert_eq!(member.user_id, user.id);
    }

    #[test]
    fn test_snapshot_from_user() {
        let user = User::new("jdoe").with_name("Jane", "Doe").with_email("jane@example.com");
        let snapshot = ImportedMember::from_user(&user, vec!["reviewer".into()]);

        assert_eq!(snapshot.id, Some(user.id));
        assert_eq!(snapshot.name.as_deref(), Some("Jane Doe"));
        assert_eq!(snapshot.roles, vec!["reviewer".to_string()]);
    }

    #[test]
    fn test_snapshot_keeps_unknown_keys() {
        let raw = json!({
            "id": null,
            "first_name": "Ext",
            "last_name": "Ernal",
            "roles": [],
            "company": "ACME",
        });
        let snapshot: ImportedMember = serde_json::from_value(raw).unwrap();
        assert_eq!(snapshot.extra.get("company"), Some(&json!("ACME")));

        let back = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(back["company"], json!("ACME"));
    }
}
