use std::borrow::Cow;

use mall_core::PermissionId;
use serde::{Deserialize, Serialize};

/// Permission token (e.g. `"stores.write"`).
///
/// Tokens are opaque at this layer and compared by exact, case-sensitive
/// equality. There is no wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(Cow<'static, str>);

impl PermissionName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PermissionName {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// A permission granted through a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
}

impl Permission {
    pub fn new(id: impl Into<String>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: PermissionId::new(id),
            name: PermissionName::new(name),
        }
    }
}
