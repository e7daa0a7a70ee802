//! Session state machine.
//!
//! [`AuthSession`] reconciles the stored token with the backend and publishes
//! the result to subscribers.
//!
//! # State Machine
//!
//! ```text
//!                 ┌────────────┐
//!   bootstrap ───▶│  Checking  │
//!                 └─────┬──────┘
//!       no token /      │      profile ok
//!       expired /       │
//!       profile failed  │
//!          ┌────────────┴─────────────┐
//!          ▼                          ▼
//!  ┌─────────────────┐  login  ┌─────────────────┐
//!  │ Unauthenticated │────────▶│  Authenticated  │
//!  └─────────────────┘◀────────└─────────────────┘
//!                     logout / expiry detected
//! ```
//!
//! Failures never surface as errors: every path settles in either
//! `Unauthenticated` or `Authenticated`.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use peoplehub_core::validation::validate_login_form;
use peoplehub_core::UserProfile;

use crate::client::{AuthBackend, LoginRequest};
use crate::error::Result;
use crate::guard::return_path;
use crate::store::{CookieStorage, CredentialStore};
use crate::token;

/// Capacity of the navigation channel.
const NAVIGATION_CAPACITY: usize = 16;

/// The current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Bootstrap is in progress.
    Checking,
    /// No usable session.
    Unauthenticated,
    /// A session is present.
    ///
    /// `user` is `None` right after a login whose response carried no
    /// profile; it is filled by the next bootstrap.
    Authenticated {
        /// The signed-in user, once known.
        user: Option<UserProfile>,
    },
}

impl AuthState {
    /// Returns `true` for `Authenticated`.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Returns `true` once bootstrap has finished.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Checking)
    }

    /// The signed-in user, if known.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated { user } => user.as_ref(),
            _ => None,
        }
    }
}

/// A navigation the UI should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Go to the login entry point.
    Login(String),
    /// Go to an application path.
    Path(String),
}

/// The authentication state machine.
///
/// Owns the credential store and is the only component that changes the
/// auth state. State changes are published synchronously through a
/// [`watch`] channel.
pub struct AuthSession<B, C>
where
    B: AuthBackend,
    C: CookieStorage,
{
    backend: Arc<B>,
    store: Arc<CredentialStore<C>>,
    state: watch::Sender<AuthState>,
    navigation: broadcast::Sender<Navigation>,
    login_path: String,
}

impl<B, C> AuthSession<B, C>
where
    B: AuthBackend,
    C: CookieStorage,
{
    /// Create a session in the `Checking` state.
    pub fn new(backend: Arc<B>, store: Arc<CredentialStore<C>>) -> Self {
        let (state, _) = watch::channel(AuthState::Checking);
        let (navigation, _) = broadcast::channel(NAVIGATION_CAPACITY);
        Self {
            backend,
            store,
            state,
            navigation,
            login_path: "/login".to_string(),
        }
    }

    /// Use `path` as the login entry point for logout navigation.
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Subscribe to navigation requests.
    #[must_use]
    pub fn navigations(&self) -> broadcast::Receiver<Navigation> {
        self.navigation.subscribe()
    }

    /// The credential store.
    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore<C>> {
        &self.store
    }

    /// The current session token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get_token()
    }

    fn settle(&self, next: AuthState) {
        tracing::debug!(state = ?StateName(&next), "Auth state changed");
        self.state.send_replace(next);
    }

    fn navigate(&self, to: Navigation) {
        // No receivers is fine: nobody is rendering.
        let _ = self.navigation.send(to);
    }

    /// Reconcile the stored token with the backend.
    ///
    /// Always settles in `Unauthenticated` or `Authenticated`; a token that is
    /// missing, expired, malformed or rejected by the backend is cleared.
    pub async fn bootstrap(&self) -> AuthState {
        self.settle(AuthState::Checking);

        let Some(token) = self.store.reload() else {
            tracing::debug!("No session token");
            self.settle(AuthState::Unauthenticated);
            return self.state();
        };

        if let Err(e) = token::check_expiry_at(&token, token::now()) {
            tracing::info!(error = %e, "Stored session token unusable");
            self.store.clear_token();
            self.settle(AuthState::Unauthenticated);
            return self.state();
        }

        match self.backend.fetch_profile(&token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "Session confirmed");
                self.settle(AuthState::Authenticated { user: Some(user) });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session bootstrap failed");
                self.store.clear_token();
                self.settle(AuthState::Unauthenticated);
            }
        }
        self.state()
    }

    /// Record a freshly issued token.
    ///
    /// The token is not re-checked for expiry: it was just issued.
    pub fn login(&self, token: &str, user: Option<UserProfile>) {
        self.store.set_token(token);
        self.settle(AuthState::Authenticated { user });
    }

    /// Validate the login form, exchange credentials with the backend and
    /// record the resulting session. On success the UI is asked to navigate
    /// to `from` if it is a same-site path (see [`return_path`]), else `/`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for form errors and `LoginFailed` (or a transport
    /// error) when the backend rejects the credentials. The state is left
    /// unchanged on failure.
    pub async fn sign_in(&self, email: &str, password: &str, from: Option<&str>) -> Result<()> {
        validate_login_form(email, password)?;

        let response = self
            .backend
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.login(&response.access_token, response.user);
        self.navigate(Navigation::Path(return_path(from)));
        Ok(())
    }

    /// End the session and ask the UI to show the login screen.
    pub fn logout(&self) {
        self.store.clear_token();
        self.settle(AuthState::Unauthenticated);
        self.navigate(Navigation::Login(self.login_path.clone()));
    }

    /// Drop the session if its token has expired since it was stored.
    ///
    /// Returns `true` if the session was dropped.
    pub fn check_expiry(&self) -> bool {
        let Some(token) = self.store.get_token() else {
            return false;
        };
        if token::is_valid(&token) {
            return false;
        }

        tracing::info!("Session token expired");
        self.store.clear_token();
        self.settle(AuthState::Unauthenticated);
        true
    }
}

/// Logs a state without the user's details.
struct StateName<'a>(&'a AuthState);

impl std::fmt::Debug for StateName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self.0 {
            AuthState::Checking => "Checking",
            AuthState::Unauthenticated => "Unauthenticated",
            AuthState::Authenticated { .. } => "Authenticated",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockAuthBackend;
    use crate::error::AuthError;
    use crate::store::{MemoryCookies, AUTH_COOKIE};
    use crate::test_support::{sample_profile, token_expiring_in};

    fn session(backend: MockAuthBackend) -> AuthSession<MockAuthBackend, MemoryCookies> {
        let store = Arc::new(CredentialStore::new(MemoryCookies::new()));
        AuthSession::new(Arc::new(backend), store)
    }

    fn session_with_cookie(
        backend: MockAuthBackend,
        token: &str,
    ) -> AuthSession<MockAuthBackend, MemoryCookies> {
        let jar = MemoryCookies::new();
        jar.set(crate::store::auth_cookie(token));
        AuthSession::new(Arc::new(backend), Arc::new(CredentialStore::new(jar)))
    }

    #[test]
    fn starts_checking() {
        let session = session(MockAuthBackend::rejecting());
        assert_eq!(session.state(), AuthState::Checking);
        assert!(!session.state().is_settled());
    }

    #[tokio::test]
    async fn bootstrap_without_token() {
        let backend = Arc::new(MockAuthBackend::accepting(sample_profile()));
        let store = Arc::new(CredentialStore::new(MemoryCookies::new()));
        let session = AuthSession::new(backend.clone(), store);

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(backend.profile_calls(), 0);
    }

    #[tokio::test]
    async fn bootstrap_with_expired_token_clears_it() {
        let session = session_with_cookie(
            MockAuthBackend::accepting(sample_profile()),
            &token_expiring_in(-10),
        );

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
        assert_eq!(session.store().cookies().get(AUTH_COOKIE), None);
    }

    #[tokio::test]
    async fn bootstrap_with_malformed_token_clears_it() {
        let session = session_with_cookie(MockAuthBackend::accepting(sample_profile()), "nope");

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn bootstrap_confirms_profile() {
        let token = token_expiring_in(7200);
        let session = session_with_cookie(MockAuthBackend::accepting(sample_profile()), &token);

        let state = session.bootstrap().await;
        assert_eq!(
            state,
            AuthState::Authenticated {
                user: Some(sample_profile())
            }
        );
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("1"));
        assert_eq!(session.token(), Some(token));
    }

    #[tokio::test]
    async fn bootstrap_profile_rejection_clears_token() {
        let session = session_with_cookie(MockAuthBackend::rejecting(), &token_expiring_in(7200));

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
        assert_eq!(session.store().cookies().get(AUTH_COOKIE), None);
    }

    #[tokio::test]
    async fn bootstrap_always_settles() {
        let cases = [
            (None, MockAuthBackend::rejecting()),
            (Some("x.y.z".to_string()), MockAuthBackend::rejecting()),
            (Some(token_expiring_in(-1)), MockAuthBackend::rejecting()),
            (Some(token_expiring_in(60)), MockAuthBackend::rejecting()),
            (
                Some(token_expiring_in(60)),
                MockAuthBackend::accepting(sample_profile()),
            ),
        ];

        for (token, backend) in cases {
            let session = match &token {
                Some(t) => session_with_cookie(backend, t),
                None => session(backend),
            };
            let state = session.bootstrap().await;
            assert!(state.is_settled(), "{token:?} left state {state:?}");
            assert_eq!(state, session.state());
        }
    }

    #[tokio::test]
    async fn subscribers_see_checking_then_settled() {
        let session = session_with_cookie(
            MockAuthBackend::accepting(sample_profile()),
            &token_expiring_in(60),
        );
        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow_and_update(), AuthState::Checking);

        session.bootstrap().await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());
    }

    #[test]
    fn login_is_provisional_without_profile() {
        let session = session(MockAuthBackend::rejecting());
        session.login("fresh", None);

        assert_eq!(session.state(), AuthState::Authenticated { user: None });
        assert_eq!(session.token().as_deref(), Some("fresh"));
        assert_eq!(
            session.store().cookies().get(AUTH_COOKIE).as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn logout_clears_and_navigates() {
        let session = session(MockAuthBackend::rejecting());
        let mut nav = session.navigations();
        session.login("fresh", Some(sample_profile()));

        session.logout();
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
        assert_eq!(session.store().cookies().get(AUTH_COOKIE), None);
        assert_eq!(nav.try_recv().unwrap(), Navigation::Login("/login".into()));
    }

    #[tokio::test]
    async fn sign_in_records_session_and_navigates_back() {
        let backend = MockAuthBackend::accepting(sample_profile())
            .with_login(token_expiring_in(3600), true);
        let session = session(backend);
        let mut nav = session.navigations();

        session
            .sign_in("a@b.com", "pw", Some("/people"))
            .await
            .unwrap();
        assert_eq!(
            session.state(),
            AuthState::Authenticated {
                user: Some(sample_profile())
            }
        );
        assert_eq!(nav.try_recv().unwrap(), Navigation::Path("/people".into()));
    }

    #[tokio::test]
    async fn sign_in_never_navigates_off_site() {
        for from in ["//evil.example", "/\t/evil.example", "/people\n", "https://evil.example"] {
            let backend = MockAuthBackend::accepting(sample_profile())
                .with_login(token_expiring_in(3600), false);
            let session = session(backend);
            let mut nav = session.navigations();

            session.sign_in("a@b.com", "pw", Some(from)).await.unwrap();
            assert_eq!(nav.try_recv().unwrap(), Navigation::Path("/".into()), "{from:?}");
        }
    }

    #[tokio::test]
    async fn sign_in_rejects_invalid_form_without_backend_call() {
        let session = session(MockAuthBackend::rejecting());

        let err = session.sign_in("bad", "", None).await.unwrap_err();
        match err {
            AuthError::Validation(errors) => {
                assert!(errors.get("email").is_some());
                assert!(errors.get("password").is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.state(), AuthState::Checking);
    }

    #[tokio::test]
    async fn sign_in_failure_leaves_state() {
        let session = session(MockAuthBackend::rejecting());
        session.bootstrap().await;

        let err = session.sign_in("a@b.com", "pw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed(_)));
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn check_expiry_drops_stale_session() {
        let session = session(MockAuthBackend::rejecting());
        assert!(!session.check_expiry());

        session.login(&token_expiring_in(3600), None);
        assert!(!session.check_expiry());
        assert!(session.state().is_authenticated());

        session.login(&token_expiring_in(-5), None);
        assert!(session.check_expiry());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(session.token(), None);
    }

    #[tokio::test]
    async fn bootstrap_sees_cookie_written_elsewhere() {
        let session = session(MockAuthBackend::accepting(sample_profile()));
        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);

        session
            .store()
            .cookies()
            .set(crate::store::auth_cookie(&token_expiring_in(60)));
        assert!(session.bootstrap().await.is_authenticated());
    }
}
