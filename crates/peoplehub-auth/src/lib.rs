//! Session handling for peoplehub.
//!
//! This crate is the authentication core shared by the web edge and any
//! client front-end:
//!
//! - Token decoding and expiry checks (no signature validation)
//! - Credential storage: the `auth-token` cookie plus an in-memory mirror
//! - The session state machine, bootstrapped against the backend profile
//!   endpoint
//! - Route gating, applied at the edge and again after bootstrap
//! - A REST client for the backend API
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   UI / Gateway   │────▶│    RouteGuard    │
//! │                  │     │  (edge, client)  │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │ subscribe              │ decode exp
//! ┌────────▼─────────┐     ┌────────▼─────────┐
//! │   AuthSession    │────▶│ CredentialStore  │
//! │  (state machine) │     │ (cookie+mirror)  │
//! └────────┬─────────┘     └──────────────────┘
//!          │ HTTPS
//! ┌────────▼─────────┐
//! │   AuthBackend    │
//! │   (ApiClient)    │
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use peoplehub_auth::{ApiClient, AuthConfig, AuthSession, CredentialStore, MemoryCookies};
//!
//! # async fn example() {
//! let store = Arc::new(CredentialStore::new(MemoryCookies::new()));
//! let api = ApiClient::new(AuthConfig::default()).with_credentials(store.clone());
//! let session = AuthSession::new(Arc::new(api.clone()), store);
//!
//! let state = session.bootstrap().await;
//! if let Some(user) = state.user() {
//!     println!("Signed in as {}", user.display_name());
//!     let people = api.list_people(None).await;
//! }
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod guard;
pub mod session;
pub mod store;
pub mod token;

use serde::Deserialize;

pub use client::{ApiClient, AuthBackend, LoginRequest, LoginResponse};
pub use error::{AuthError, Result};
pub use guard::{
    return_path, ClientDecision, GuardDecision, LoginRedirect, PublicPaths, RouteGuard,
    DEFAULT_LOGIN_PATH,
};
pub use session::{AuthSession, AuthState, Navigation};
pub use store::{
    auth_cookie, expired_auth_cookie, CookieStorage, CredentialStore, MemoryCookies,
    RequestCookies, TokenSource, AUTH_COOKIE,
};
pub use token::{decode_expiry, is_valid};

#[cfg(any(test, feature = "test-utils"))]
pub use client::MockAuthBackend;

/// Configuration for the backend API.
///
/// Endpoint paths are configuration rather than contract: deployments have
/// used both `/auth/login` and `/api/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the backend (e.g., `http://localhost:4000`).
    #[serde(default)]
    pub api_base_url: String,

    /// Credential exchange endpoint.
    #[serde(default = "AuthConfig::default_login_path")]
    pub login_path: String,

    /// Profile endpoint used at session bootstrap.
    #[serde(default = "AuthConfig::default_profile_path")]
    pub profile_path: String,

    /// People collection endpoint.
    #[serde(default = "AuthConfig::default_people_path")]
    pub people_path: String,

    /// Error-event feed shown on the monitoring dashboard.
    #[serde(default = "AuthConfig::default_events_path")]
    pub events_path: String,

    /// Backend health report.
    #[serde(default = "AuthConfig::default_health_path")]
    pub health_path: String,

    /// Request timeout in seconds.
    #[serde(default = "AuthConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl AuthConfig {
    fn default_login_path() -> String {
        "/auth/login".to_string()
    }

    fn default_profile_path() -> String {
        "/auth/me".to_string()
    }

    fn default_people_path() -> String {
        "/api/people".to_string()
    }

    fn default_events_path() -> String {
        "/api/events".to_string()
    }

    fn default_health_path() -> String {
        "/health".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url.trim_end_matches('/'))
    }

    /// Get the login endpoint URL.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.url(&self.login_path)
    }

    /// Get the profile endpoint URL.
    #[must_use]
    pub fn profile_url(&self) -> String {
        self.url(&self.profile_path)
    }

    /// Get the people collection URL.
    #[must_use]
    pub fn people_url(&self) -> String {
        self.url(&self.people_path)
    }

    /// Get the error-event feed URL.
    #[must_use]
    pub fn events_url(&self) -> String {
        self.url(&self.events_path)
    }

    /// Get the backend health URL.
    #[must_use]
    pub fn health_url(&self) -> String {
        self.url(&self.health_path)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            login_path: Self::default_login_path(),
            profile_path: Self::default_profile_path(),
            people_path: Self::default_people_path(),
            events_path: Self::default_events_path(),
            health_path: Self::default_health_path(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use base64::prelude::*;
    use serde_json::{json, Value};

    use peoplehub_core::UserProfile;

    /// A structurally valid token with `claims` as payload and a dummy signature.
    pub fn unsigned_token(claims: &Value) -> String {
        let header = BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = BASE64_URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    pub fn token_expiring_at(exp: i64) -> String {
        unsigned_token(&json!({ "sub": "1", "exp": exp }))
    }

    pub fn token_expiring_in(secs: i64) -> String {
        token_expiring_at(crate::token::now() + secs)
    }

    pub fn sample_profile() -> UserProfile {
        UserProfile {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            role: "user".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }
}
