//! Route and content guards.
//!
//! Both guards are pure functions of session state plus declarative
//! [`Requirements`]. They never fail: a missing session is simply a
//! requirement that is not met.

use crate::capability::Capabilities;
use crate::navigation::Destination;
use crate::permissions::PermissionName;
use crate::roles::RoleName;
use crate::session::SessionState;

/// How listed roles and permissions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Match {
    /// Holding any one listed role or permission suffices.
    #[default]
    Any,
    /// Every listed role and every listed permission must be held.
    All,
}

/// Declarative access requirements for a route or a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirements {
    roles: Vec<RoleName>,
    permissions: Vec<PermissionName>,
    mode: Match,
}

impl Requirements {
    /// Any authenticated session passes.
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self::default().with_roles(roles)
    }

    pub fn permissions<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionName>,
    {
        Self::default().with_permissions(permissions)
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionName>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn require_all(mut self) -> Self {
        self.mode = Match::All;
        self
    }

    pub fn mode(&self) -> Match {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.permissions.is_empty()
    }

    /// Whether `caps` meets these requirements. Unauthenticated never does.
    pub fn is_satisfied_by<C: Capabilities + ?Sized>(&self, caps: &C) -> bool {
        if !caps.is_authenticated() {
            return false;
        }
        if self.is_empty() {
            return true;
        }

        match self.mode {
            Match::Any => {
                self.roles.iter().any(|r| caps.has_role(r.as_str()))
                    || self.permissions.iter().any(|p| caps.has_permission(p.as_str()))
            }
            Match::All => {
                self.roles.iter().all(|r| caps.has_role(r.as_str()))
                    && self.permissions.iter().all(|p| caps.has_permission(p.as_str()))
            }
        }
    }
}

/// Outcome of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session still resolving: show a placeholder, do not redirect yet.
    Loading,
    Render,
    Redirect(Destination),
}

/// Route-level guard.
///
/// - loading → [`RouteDecision::Loading`]
/// - unauthenticated → redirect to login
/// - authenticated but requirements unmet → redirect to unauthorized
/// - otherwise render
pub fn guard_route(session: &SessionState, requirements: &Requirements) -> RouteDecision {
    if session.loading {
        return RouteDecision::Loading;
    }
    if !session.is_authenticated() {
        return RouteDecision::Redirect(Destination::Login);
    }
    if requirements.is_satisfied_by(session) {
        RouteDecision::Render
    } else {
        tracing::debug!(
            user = session.user.as_ref().map(|u| u.email.as_str()),
            ?requirements,
            "route requirements not met"
        );
        RouteDecision::Redirect(Destination::Unauthorized)
    }
}

/// Content-level guard: never navigates.
///
/// Returns `children` when the requirements hold, otherwise `fallback`
/// (`None` renders nothing).
pub fn guard_content<C, T>(
    caps: &C,
    requirements: &Requirements,
    children: T,
    fallback: Option<T>,
) -> Option<T>
where
    C: Capabilities + ?Sized,
{
    if requirements.is_satisfied_by(caps) {
        Some(children)
    } else {
        fallback
    }
}
