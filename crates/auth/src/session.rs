//! Session store: the single source of truth for "who is logged in".
//!
//! State is published through a `tokio::sync::watch` channel so every
//! dependent view observes each transition. Committed changes are ordered by
//! an epoch counter: an `initialize` or `login` that was suspended while a
//! `logout` or a successful `login` landed is discarded instead of
//! resurrecting the old session. A failed login commits nothing and so
//! supersedes nothing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;

use crate::capability::Capabilities;
use crate::credential::CredentialStore;
use crate::error::AuthError;
use crate::navigation::Destination;
use crate::user::{User, is_plausible_email};

/// Backend operations the session needs.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and the user record.
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, AuthError>;

    /// Resolve a persisted token to its user.
    async fn resolve(&self, token: &str) -> Result<User, AuthError>;
}

#[async_trait]
impl<B> AuthBackend for Arc<B>
where
    B: AuthBackend + ?Sized,
{
    async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, AuthError> {
        (**self).login(email, password).await
    }

    async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        (**self).resolve(token).await
    }
}

/// Successful login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginGrant {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    pub user: User,
}

/// Snapshot of the session.
///
/// `user` is `None` iff unauthenticated. `loading` stays `true` until the
/// bootstrap resolution finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    fn bootstrapping() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl Capabilities for SessionState {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn has_role(&self, role: &str) -> bool {
        self.user.has_role(role)
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.user.has_permission(permission)
    }
}

pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    credentials: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    /// Bumped by logout and by committed logins; guards suspended operations.
    epoch: Mutex<u64>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::bootstrapping());
        Self {
            backend,
            credentials,
            state,
            epoch: Mutex::new(0),
        }
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state.borrow().has_role(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.state.borrow().has_permission(permission)
    }

    /// Resolve the persisted credential, if any.
    ///
    /// A token that fails to resolve (for any reason) is cleared. `loading`
    /// becomes `false` only once resolution has finished.
    pub async fn initialize(&self) {
        let epoch = self.begin();

        let Some(token) = self.credentials.load() else {
            tracing::debug!("no persisted session");
            self.commit(epoch, false, |_| {}, None);
            return;
        };

        match self.backend.resolve(&token).await {
            Ok(user) => {
                tracing::info!(user = %user.email, "session restored");
                self.commit(epoch, false, |_| {}, Some(user));
            }
            Err(e) => {
                tracing::warn!("persisted session rejected: {e}");
                self.commit(epoch, false, |creds| creds.clear(), None);
            }
        }
    }

    /// Log in and return where the UI should navigate.
    pub async fn login(&self, email: &str, password: &str) -> Result<Destination, AuthError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(AuthError::InvalidInput("Enter a valid email address.".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("Enter your password.".to_string()));
        }

        let epoch = self.begin();

        let grant = match self.backend.login(email, password).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(email, "login failed: {e}");
                return Err(e);
            }
        };

        let destination = Destination::after_login(&grant.user);
        let token = grant.token;
        let committed = self.commit(
            epoch,
            true,
            |creds| {
                if let Err(e) = creds.save(&token) {
                    tracing::warn!("failed to persist session token: {e}");
                }
            },
            Some(grant.user),
        );

        if !committed {
            return Err(AuthError::SessionExpired);
        }

        tracing::info!(email, ?destination, "login succeeded");
        Ok(destination)
    }

    /// Clear the credential and the in-memory user. Never fails.
    pub fn logout(&self) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        self.credentials.clear();
        self.state.send_modify(|s| {
            s.user = None;
            s.loading = false;
        });
        tracing::info!("logged out");
    }

    fn begin(&self) -> u64 {
        *self.lock_epoch()
    }

    /// Apply a result if nothing was committed since `started`.
    ///
    /// `supersede` bumps the epoch so older in-flight work is discarded. A
    /// stale result only clears `loading`, so a superseded bootstrap cannot
    /// leave the UI waiting forever.
    fn commit<F>(&self, started: u64, supersede: bool, persist: F, user: Option<User>) -> bool
    where
        F: FnOnce(&dyn CredentialStore),
    {
        let mut epoch = self.lock_epoch();
        if *epoch != started {
            tracing::debug!(started, current = *epoch, "discarding superseded session result");
            self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));
            return false;
        }

        if supersede {
            *epoch += 1;
        }
        persist(self.credentials.as_ref());
        self.state.send_replace(SessionState {
            user,
            loading: false,
        });
        true
    }

    fn lock_epoch(&self) -> std::sync::MutexGuard<'_, u64> {
        // The guarded value is a plain counter; a poisoned lock still holds a
        // valid one.
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::InMemoryCredentialStore;
    use crate::{Role, RoleName};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct FakeBackend {
        users: Vec<(String, String, User)>,
        resolve_calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        resolve_gate: Option<Arc<Notify>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                users: vec![
                    (
                        "admin@mall.test".to_string(),
                        "secret1".to_string(),
                        User::new("1", "admin@mall.test", "Ada", "", vec![Role::new("1", RoleName::ADMIN)]),
                    ),
                    (
                        "client@mall.test".to_string(),
                        "secret2".to_string(),
                        User::new("2", "client@mall.test", "Cleo", "", vec![Role::new("5", RoleName::USER)]),
                    ),
                ],
                resolve_calls: AtomicUsize::new(0),
                gate: None,
                resolve_gate: None,
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new()
            }
        }

        fn slow_resolve(gate: Arc<Notify>) -> Self {
            Self {
                resolve_gate: Some(gate),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, AuthError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.users
                .iter()
                .find(|(e, p, _)| e == email && p == password)
                .map(|(e, _, u)| LoginGrant {
                    token: format!("token-{e}"),
                    user: u.clone(),
                })
                .ok_or(AuthError::InvalidCredentials)
        }

        async fn resolve(&self, token: &str) -> Result<User, AuthError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.resolve_gate {
                gate.notified().await;
            }
            self.users
                .iter()
                .find(|(e, _, _)| token == format!("token-{e}"))
                .map(|(_, _, u)| u.clone())
                .ok_or(AuthError::SessionExpired)
        }
    }

    fn store_with(backend: FakeBackend, creds: Arc<InMemoryCredentialStore>) -> SessionStore {
        SessionStore::new(Arc::new(backend), creds)
    }

    #[tokio::test]
    async fn starts_loading_and_resolves_without_token() {
        let creds = Arc::new(InMemoryCredentialStore::new());
        let store = store_with(FakeBackend::new(), creds);
        assert!(store.is_loading());

        store.initialize().await;
        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn initialize_restores_persisted_session() {
        let creds = Arc::new(InMemoryCredentialStore::with_token("token-admin@mall.test"));
        let store = store_with(FakeBackend::new(), creds.clone());

        store.initialize().await;
        assert!(store.has_role("ADMIN"));
        assert!(!store.is_loading());
        assert!(creds.load().is_some());
    }

    #[tokio::test]
    async fn initialize_clears_unresolvable_token() {
        let creds = Arc::new(InMemoryCredentialStore::with_token("stale"));
        let store = store_with(FakeBackend::new(), creds.clone());

        store.initialize().await;
        assert!(store.user().is_none());
        assert!(!store.is_loading());
        assert_eq!(creds.load(), None);
    }

    #[tokio::test]
    async fn login_persists_token_and_routes_by_role() {
        let creds = Arc::new(InMemoryCredentialStore::new());
        let store = store_with(FakeBackend::new(), creds.clone());
        store.initialize().await;

        let dest = store.login("admin@mall.test", "secret1").await.unwrap();
        assert_eq!(dest, Destination::AdminDashboard);
        assert_eq!(creds.load().as_deref(), Some("token-admin@mall.test"));

        store.logout();
        let dest = store.login(" client@mall.test ", "secret2").await.unwrap();
        assert_eq!(dest, Destination::Home);
        assert!(store.has_role("USER"));
        assert!(!store.has_role("ADMIN"));
    }

    #[tokio::test]
    async fn bad_credentials_leave_session_untouched() {
        let creds = Arc::new(InMemoryCredentialStore::new());
        let store = store_with(FakeBackend::new(), creds.clone());
        store.initialize().await;

        let err = store.login("admin@mall.test", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(store.user().is_none());
        assert_eq!(creds.load(), None);
    }

    #[tokio::test]
    async fn malformed_input_is_rejected_before_the_backend() {
        let store = store_with(FakeBackend::new(), Arc::new(InMemoryCredentialStore::new()));
        assert!(matches!(
            store.login("not-an-email", "x").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            store.login("admin@mall.test", "").await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let store = store_with(FakeBackend::new(), Arc::new(InMemoryCredentialStore::new()));
        let mut rx = store.subscribe();

        store.initialize().await;
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().loading);

        store.login("admin@mall.test", "secret1").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().user.is_some());

        store.logout();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().user.is_none());
    }

    #[tokio::test]
    async fn logout_during_login_wins() {
        let gate = Arc::new(Notify::new());
        let creds = Arc::new(InMemoryCredentialStore::new());
        let store = Arc::new(store_with(FakeBackend::gated(gate.clone()), creds.clone()));
        store.initialize().await;

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.login("admin@mall.test", "secret1").await })
        };
        tokio::task::yield_now().await;

        store.logout();
        gate.notify_one();

        let result = pending.await.unwrap();
        assert_eq!(result, Err(AuthError::SessionExpired));
        assert!(store.user().is_none());
        assert_eq!(creds.load(), None);
    }

    #[tokio::test]
    async fn failed_login_during_bootstrap_keeps_restored_session() {
        let gate = Arc::new(Notify::new());
        let creds = Arc::new(InMemoryCredentialStore::with_token("token-admin@mall.test"));
        let store = Arc::new(store_with(FakeBackend::slow_resolve(gate.clone()), creds.clone()));

        let bootstrap = {
            let store = store.clone();
            tokio::spawn(async move { store.initialize().await })
        };
        tokio::task::yield_now().await;

        let err = store.login("admin@mall.test", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        gate.notify_one();
        bootstrap.await.unwrap();

        assert!(store.has_role("ADMIN"));
        assert!(!store.is_loading());
        assert_eq!(creds.load().as_deref(), Some("token-admin@mall.test"));
    }

    #[tokio::test]
    async fn successful_login_supersedes_pending_bootstrap() {
        let gate = Arc::new(Notify::new());
        let creds = Arc::new(InMemoryCredentialStore::with_token("token-admin@mall.test"));
        let store = Arc::new(store_with(FakeBackend::slow_resolve(gate.clone()), creds.clone()));

        let bootstrap = {
            let store = store.clone();
            tokio::spawn(async move { store.initialize().await })
        };
        tokio::task::yield_now().await;

        store.login("client@mall.test", "secret2").await.unwrap();
        gate.notify_one();
        bootstrap.await.unwrap();

        assert!(store.has_role("USER"));
        assert!(!store.has_role("ADMIN"));
        assert_eq!(creds.load().as_deref(), Some("token-client@mall.test"));
    }
}
