//! User model
//!
//! Table: users

use chrono::{DateTime, Utc};
use rc_core::traits::{new_id, Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User entity
///
/// A pentester account in this system. Only the contact and name
/// attributes travel inside archives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Id,

    /// Login name (unique)
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(max = 255))]
    pub title_before: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 255))]
    pub middle_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    #[validate(length(max = 255))]
    pub title_after: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 255))]
    pub phone: Option<String>,

    #[validate(length(max = 255))]
    pub mobile: Option<String>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            username: username.into(),
            title_before: None,
            first_name: None,
            middle_name: None,
            last_name: None,
            title_after: None,
            email: None,
            phone: None,
            mobile: None,
            created: now,
            updated: now,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Full display name including academic titles
    pub fn name(&self) -> String {
        let mut name = String::new();
        if let Some(title) = self.title_before.as_deref().filter(|t| !t.is_empty()) {
            name.push_str(title);
            name.push(' ');
        }
        name.push_str(self.first_name.as_deref().unwrap_or(""));
        name.push(' ');
        if let Some(middle) = self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            name.push_str(middle);
            name.push(' ');
        }
        name.push_str(self.last_name.as_deref().unwrap_or(""));
        if let Some(title) = self.title_after.as_deref().filter(|t| !t.is_empty()) {
            name.push_str(", ");
            name.push_str(title);
        }
        name
    }
}

impl Identifiable for User {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for User {
    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}
