//! The authenticated principal, also listed on the admin users screen.

use mall_core::{DomainError, DomainResult, Entity, Listable, Resource, RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// A user account as returned by the backend.
///
/// `roles` is always present once deserialized (missing means empty). The
/// full name is derived when the value is built or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UserRepr")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
    #[serde(skip)]
    full_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRepr {
    id: UserId,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    roles: Vec<Role>,
}

impl From<UserRepr> for User {
    fn from(repr: UserRepr) -> Self {
        let mut user = Self {
            id: repr.id,
            email: repr.email,
            first_name: repr.first_name,
            last_name: repr.last_name,
            phone: repr.phone,
            roles: repr.roles,
            full_name: String::new(),
        };
        user.refresh_full_name();
        user
    }
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        UserRepr {
            id: UserId::new(id),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            roles,
        }
        .into()
    }

    /// "First Last", falling back to the email when both names are blank.
    pub fn full_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }

    fn refresh_full_name(&mut self) {
        self.full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string();
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.name.as_str())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl Listable for User {
    fn display_name(&self) -> &str {
        self.full_name()
    }

    fn identifier(&self) -> Option<&str> {
        Some(&self.email)
    }

    fn description(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// Create/update payload for the admin users screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Required on create; omitted on update to keep the current password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl UserDraft {
    pub const MIN_PASSWORD_LEN: usize = 6;

    pub fn validate(&self) -> DomainResult<()> {
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation("invalid email format"));
        }
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first name cannot be empty"));
        }
        if let Some(password) = self.password.as_deref() {
            if password.chars().count() < Self::MIN_PASSWORD_LEN {
                return Err(DomainError::validation(format!(
                    "password must be at least {} characters",
                    Self::MIN_PASSWORD_LEN
                )));
            }
        }
        Ok(())
    }
}

impl Resource for User {
    const COLLECTION: &'static str = "users";

    type Draft = UserDraft;

    fn validate_draft(draft: &UserDraft) -> DomainResult<()> {
        draft.validate()
    }
}

/// `local@domain.tld` with no whitespace; deliverability is the backend's job.
pub(crate) fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
