//! Field adapters
//!
//! References to users and templates are resolved on a best-effort basis:
//! a null or dangling reference yields [`Resolved::Skipped`] instead of an
//! error, and the owning entity falls back to its own default.

use rc_core::traits::Id;
use rc_db::Store;
use rc_models::{ImportedMember, User};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ArchiveResult;

/// Outcome of a best-effort field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<T> {
    Value(T),
    /// No value to apply; the field behaves as if it was absent
    Skipped,
}

impl<T> Resolved<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Overwrite `target` only when a value was resolved
    pub fn apply_to(self, target: &mut Option<T>) {
        if let Self::Value(v) = self {
            *target = Some(v);
        }
    }
}

/// Reference to a user by id
///
/// Written as `{"id": ...}`; a bare id is accepted on import as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Object { id: Option<Id> },
    Id(Id),
}

impl UserRef {
    pub fn new(id: Id) -> Self {
        Self::Object { id: Some(id) }
    }

    pub fn id(&self) -> Option<Id> {
        match self {
            Self::Object { id } => *id,
            Self::Id(id) => Some(*id),
        }
    }
}

/// Export form of an optional assignee
pub fn user_ref(id: Option<Id>) -> Option<UserRef> {
    id.map(UserRef::new)
}

/// Resolve a user reference against the user directory
pub async fn resolve_user(
    store: &dyn Store,
    reference: Option<&UserRef>,
    field: &str,
) -> ArchiveResult<Resolved<Id>> {
    let Some(id) = reference.and_then(UserRef::id) else {
        return Ok(Resolved::Skipped);
    };

    match store.find_user(id).await? {
        Some(user) => Ok(Resolved::Value(user.id)),
        None => {
            warn!(field, user_id = %id, "Dropping reference to unknown user");
            Ok(Resolved::Skipped)
        }
    }
}

/// Resolve an optional template reference
pub async fn resolve_template(
    store: &dyn Store,
    reference: Option<Id>,
    field: &str,
) -> ArchiveResult<Resolved<Id>> {
    let Some(id) = reference else {
        return Ok(Resolved::Skipped);
    };

    if store.template_exists(id).await? {
        Ok(Resolved::Value(id))
    } else {
        warn!(field, template_id = %id, "Dropping reference to unknown template");
        Ok(Resolved::Skipped)
    }
}

/// A project member after resolution against the user directory
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMember {
    /// Membership of an existing local user
    Linked { user_id: Id, roles: Vec<String> },
    /// Snapshot of a user unknown to this system, kept as supplied
    Detached(ImportedMember),
}

impl ResolvedMember {
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }
}

/// Resolve a member snapshot to a linked membership when its user exists
pub async fn resolve_member(store: &dyn Store, member: ImportedMember) -> ArchiveResult<ResolvedMember> {
    let user: Option<User> = match member.id {
        Some(id) => store.find_user(id).await?,
        None => None,
    };

    Ok(match user {
        Some(user) => ResolvedMember::Linked {
            user_id: user.id,
            roles: member.roles,
        },
        None => {
            warn!(
                user_id = ?member.id,
                name = member.name.as_deref().unwrap_or_default(),
                "Keeping member without local user as imported member"
            );
            ResolvedMember::Detached(member)
        }
    })
}

/// Split resolved members into linked memberships and detached snapshots
pub fn partition_members(
    members: Vec<ResolvedMember>,
) -> (Vec<(Id, Vec<String>)>, Vec<ImportedMember>) {
    let mut linked = Vec::new();
    let mut detached = Vec::new();
    for member in members {
        match member {
            ResolvedMember::Linked { user_id, roles } => linked.push((user_id, roles)),
            ResolvedMember::Detached(snapshot) => detached.push(snapshot),
        }
    }
    (linked, detached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_core::traits::new_id;
    use rc_db::MemoryStore;
    use rc_models::FindingTemplate;
    use serde_json::json;

    #[test]
    fn test_user_ref_forms() {
        let id = new_id();
        let object: UserRef = serde_json::from_value(json!({"id": id})).unwrap();
        let bare: UserRef = serde_json::from_value(json!(id)).unwrap();
        assert_eq!(object.id(), Some(id));
        assert_eq!(bare.id(), Some(id));

        let null: UserRef = serde_json::from_value(json!({"id": null})).unwrap();
        assert_eq!(null.id(), None);

        assert_eq!(serde_json::to_value(UserRef::new(id)).unwrap(), json!({"id": id}));
    }

    #[test]
    fn test_apply_to_keeps_existing_value_when_skipped() {
        let existing = new_id();
        let mut target = Some(existing);
        Resolved::<Id>::Skipped.apply_to(&mut target);
        assert_eq!(target, Some(existing));

        let other = new_id();
        Resolved::Value(other).apply_to(&mut target);
        assert_eq!(target, Some(other));
    }

    #[tokio::test]
    async fn test_resolve_user() {
        let store = MemoryStore::new();
        let user = User::new("jdoe");
        store.insert_user(user.clone());

        let known = UserRef::new(user.id);
        let unknown = UserRef::new(new_id());

        assert_eq!(resolve_user(&store, Some(&known), "assignee").await.unwrap(), Resolved::Value(user.id));
        assert!(resolve_user(&store, Some(&unknown), "assignee").await.unwrap().is_skipped());
        assert!(resolve_user(&store, None, "assignee").await.unwrap().is_skipped());
    }

    #[tokio::test]
    async fn test_resolve_template() {
        let store = MemoryStore::new();
        let template = FindingTemplate::new("en-US");
        store.insert_template(template.clone());

        assert_eq!(
            resolve_template(&store, Some(template.id), "template").await.unwrap(),
            Resolved::Value(template.id)
        );
        assert!(resolve_template(&store, Some(new_id()), "template").await.unwrap().is_skipped());
        assert!(resolve_template(&store, None, "template").await.unwrap().is_skipped());
    }

    #[tokio::test]
    async fn test_resolve_member() {
        let store = MemoryStore::new();
        let user = User::new("jdoe");
        store.insert_user(user.clone());

        let linked = ImportedMember {
            id: Some(user.id),
            roles: vec!["lead".into()],
            ..Default::default()
        };
        let foreign = ImportedMember {
            id: Some(new_id()),
            first_name: Some("Ext".into()),
            ..Default::default()
        };
        let anonymous = ImportedMember::default();

        let resolved = vec![
            resolve_member(&store, linked).await.unwrap(),
            resolve_member(&store, foreign.clone()).await.unwrap(),
            resolve_member(&store, anonymous.clone()).await.unwrap(),
        ];
        assert!(resolved[0].is_linked());

        let (linked, detached) = partition_members(resolved);
        assert_eq!(linked, vec![(user.id, vec!["lead".to_string()])]);
        assert_eq!(detached, vec![foreign, anonymous]);
    }
}
