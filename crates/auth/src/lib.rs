//! `mall-auth` — session and authorization gating for the mall portal.
//!
//! This crate is decoupled from HTTP: the session talks to the backend through
//! the [`AuthBackend`] trait and persists its token through a
//! [`CredentialStore`]. Guards are pure functions over [`Capabilities`].

pub mod capability;
pub mod credential;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod user;

pub use capability::Capabilities;
pub use credential::{CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use error::AuthError;
pub use guard::{Match, Requirements, RouteDecision, guard_content, guard_route};
pub use navigation::Destination;
pub use permissions::{Permission, PermissionName};
pub use roles::{Role, RoleName};
pub use session::{AuthBackend, LoginGrant, SessionState, SessionStore};
pub use user::{User, UserDraft};
