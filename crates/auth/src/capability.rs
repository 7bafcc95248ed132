//! Capability predicates.
//!
//! Call sites ask "may this principal do X" through [`Capabilities`] and never
//! inspect the shape of the user record themselves.

use crate::user::User;

/// Role/permission predicates over an (optional) authenticated principal.
///
/// Absence of a principal answers `false` to every question; it is never an
/// error.
pub trait Capabilities {
    fn is_authenticated(&self) -> bool;

    /// Any role has exactly this name (case-sensitive).
    fn has_role(&self, role: &str) -> bool;

    /// Any role carries a permission with exactly this name.
    fn has_permission(&self, permission: &str) -> bool;
}

impl Capabilities for User {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.name.as_str() == role)
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.roles.iter().any(|r| r.grants(permission))
    }
}

impl<C: Capabilities> Capabilities for Option<C> {
    fn is_authenticated(&self) -> bool {
        self.as_ref().is_some_and(C::is_authenticated)
    }

    fn has_role(&self, role: &str) -> bool {
        self.as_ref().is_some_and(|c| c.has_role(role))
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.as_ref().is_some_and(|c| c.has_permission(permission))
    }
}

impl<C: Capabilities + ?Sized> Capabilities for &C {
    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn has_role(&self, role: &str) -> bool {
        (**self).has_role(role)
    }

    fn has_permission(&self, permission: &str) -> bool {
        (**self).has_permission(permission)
    }
}
