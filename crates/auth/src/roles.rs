use std::borrow::Cow;

use mall_core::RoleId;
use serde::{Deserialize, Serialize};

use crate::permissions::Permission;

/// Role name used for RBAC.
///
/// The backend knows five roles (see the associated constants), but names stay
/// opaque strings so an unknown role deserializes instead of failing the whole
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub const ADMIN: RoleName = RoleName(Cow::Borrowed("ADMIN"));
    pub const COLABORADOR: RoleName = RoleName(Cow::Borrowed("COLABORADOR"));
    pub const CLIENTE_INTERNO: RoleName = RoleName(Cow::Borrowed("CLIENTE_INTERNO"));
    pub const CLIENTE_EXTERNO: RoleName = RoleName(Cow::Borrowed("CLIENTE_EXTERNO"));
    pub const USER: RoleName = RoleName(Cow::Borrowed("USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Staff roles land on the admin dashboard after login.
    pub fn is_staff(&self) -> bool {
        *self == Self::ADMIN || *self == Self::COLABORADOR
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for RoleName {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// A role assigned to a user, with the permissions it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(id: impl Into<String>, name: RoleName) -> Self {
        Self {
            id: RoleId::new(id),
            name,
            permissions: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.name.as_str() == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_compare_case_sensitively() {
        assert_eq!(RoleName::new("ADMIN"), RoleName::ADMIN);
        assert_ne!(RoleName::new("admin"), RoleName::ADMIN);
    }

    #[test]
    fn unknown_role_names_still_deserialize() {
        let role: Role = serde_json::from_str(r#"{"id":3,"name":"AUDITOR"}"#).unwrap();
        assert_eq!(role.name.as_str(), "AUDITOR");
        assert!(role.permissions.is_empty());
        assert!(!role.name.is_staff());
    }

    #[test]
    fn grants_checks_permission_names() {
        let role = Role::new("1", RoleName::COLABORADOR)
            .with_permission(Permission::new("10", "stores.write"));
        assert!(role.grants("stores.write"));
        assert!(!role.grants("stores.delete"));
        assert!(role.name.is_staff());
    }
}
