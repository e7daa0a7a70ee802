//! Backend REST client.
//!
//! [`ApiClient`] talks to the external backend: credential exchange, the
//! profile lookup used at session bootstrap, and the people resource. When
//! bound to a [`TokenSource`] it attaches the current session token as a
//! bearer credential to every request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use peoplehub_core::{
    CoreError, ErrorEvent, HealthStatus, PeoplePage, Person, PersonForm, UserProfile,
};

use crate::error::{AuthError, Result};
use crate::store::TokenSource;
use crate::AuthConfig;

/// Request payload for email/password login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
}

/// Response from a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// The user's profile, when the backend includes it.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// The backend operations the session state machine depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns `LoginFailed` if the credentials are rejected, or a transport error.
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse>;

    /// Fetch the profile of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns `ProfileFetchFailed` if the backend is unreachable, rejects the
    /// token, or returns an unreadable body.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile>;
}

/// HTTP client for the backend API.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<AuthConfig>,
    client: reqwest::Client,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen with default TLS).
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .expect("failed to create HTTP client");

        Self {
            config: Arc::new(config),
            client,
            tokens: None,
        }
    }

    /// A copy of this client that authenticates with the token from `tokens`.
    ///
    /// The token is read on every request, so later `set_token`/`clear_token`
    /// calls on the store take effect immediately.
    #[must_use]
    pub fn with_credentials(&self, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
            tokens: Some(tokens),
        }
    }

    /// The client's configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.tokens.as_ref().and_then(|t| t.token()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))
    }

    /// Map a response to `T`, or to the matching error for a non-success status.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse(e.to_string()));
        }
        Err(Self::error_for(response).await)
    }

    async fn error_for(response: Response) -> AuthError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return AuthError::Unauthorized;
        }
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| "An error occurred".to_string());
        AuthError::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// URL of one person, with `id` percent-encoded as a single path segment.
    fn person_url(&self, id: &str) -> Result<String> {
        let base = self.config.people_url();
        let mut url = url::Url::parse(&base)
            .map_err(|e| AuthError::Http(format!("invalid people URL {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| AuthError::Http(format!("people URL {base} cannot take a path")))?
            .pop_if_empty()
            .push(id);
        Ok(url.into())
    }

    // =========================================================================
    // People
    // =========================================================================

    /// List people, optionally filtered by a search query.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session token is rejected, or an API or
    /// transport error.
    pub async fn list_people(&self, query: Option<&str>) -> Result<Vec<Person>> {
        let mut builder = self.request(Method::GET, &self.config.people_url());
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            builder = builder.query(&[("q", q)]);
        }

        let page: PeoplePage = Self::read_json(Self::send(builder).await?).await?;
        tracing::debug!(count = page.items.len(), "Listed people");
        Ok(page.items)
    }

    /// Fetch a single person.
    ///
    /// # Errors
    ///
    /// Returns `Core(PersonNotFound)` for an unknown ID, or an API or transport error.
    pub async fn get_person(&self, id: &str) -> Result<Person> {
        let response = Self::send(self.request(Method::GET, &self.person_url(id)?)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::PersonNotFound(id.to_string()).into());
        }
        Self::read_json(response).await
    }

    /// Create a person.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the form is invalid, or an API or transport error.
    pub async fn create_person(&self, form: &PersonForm) -> Result<Person> {
        peoplehub_core::validation::validate_person_form(form)?;
        let builder = self
            .request(Method::POST, &self.config.people_url())
            .json(form);
        Self::read_json(Self::send(builder).await?).await
    }

    /// Update a person.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the form is invalid, `Core(PersonNotFound)` for
    /// an unknown ID, or an API or transport error.
    pub async fn update_person(&self, id: &str, form: &PersonForm) -> Result<Person> {
        peoplehub_core::validation::validate_person_form(form)?;
        let builder = self
            .request(Method::PATCH, &self.person_url(id)?)
            .json(form);
        let response = Self::send(builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CoreError::PersonNotFound(id.to_string()).into());
        }
        Self::read_json(response).await
    }

    /// Delete a person.
    ///
    /// # Errors
    ///
    /// Returns `Core(PersonNotFound)` for an unknown ID, or an API or transport error.
    pub async fn delete_person(&self, id: &str) -> Result<()> {
        let response = Self::send(self.request(Method::DELETE, &self.person_url(id)?)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(CoreError::PersonNotFound(id.to_string()).into()),
            s if s.is_success() => Ok(()),
            _ => Err(Self::error_for(response).await),
        }
    }

    // =========================================================================
    // Monitoring
    // =========================================================================

    /// Fetch the error events captured by the backend.
    ///
    /// A body that is not a JSON array is read as "no events".
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session token is rejected, or an API or
    /// transport error.
    pub async fn list_events(&self) -> Result<Vec<ErrorEvent>> {
        let builder = self.request(Method::GET, &self.config.events_url());
        let body: serde_json::Value = Self::read_json(Self::send(builder).await?).await?;
        if !body.is_array() {
            tracing::debug!("Event feed is not a list, showing none");
            return Ok(Vec::new());
        }

        let events: Vec<ErrorEvent> = serde_json::from_value(body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        tracing::debug!(count = events.len(), "Listed error events");
        Ok(events)
    }

    /// Fetch the backend's health report.
    ///
    /// A degraded backend may answer with an error status and a report; the
    /// report is returned either way.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session token is rejected, `Api` for an
    /// error status without a report, or a transport error.
    pub async fn backend_health(&self) -> Result<HealthStatus> {
        let response = Self::send(self.request(Method::GET, &self.config.health_url())).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthorized);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::Http(e.to_string()))?;
        match serde_json::from_slice::<HealthStatus>(&bytes) {
            Ok(health) => Ok(health),
            Err(e) if status.is_success() => Err(AuthError::InvalidResponse(e.to_string())),
            Err(_) => Err(AuthError::Api {
                status: status.as_u16(),
                message: "An error occurred".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        let url = self.config.login_url();
        let response = Self::send(self.client.post(&url).json(req)).await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse(e.to_string()));
        }

        match Self::error_for(response).await {
            AuthError::Unauthorized => Err(AuthError::LoginFailed(
                "Invalid credentials. Please try again.".to_string(),
            )),
            AuthError::Api { status, message } if (400..500).contains(&status) => {
                Err(AuthError::LoginFailed(message))
            }
            other => Err(other),
        }
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        let url = self.config.profile_url();
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ProfileFetchFailed(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchFailed(format!("invalid profile: {e}")))
    }
}

/// A scripted backend for testing.
///
/// Accepts any credentials when `access_token` is set, and answers every
/// profile lookup with `profile` (or a rejection when `None`).
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockAuthBackend {
    /// Profile returned by `fetch_profile`; `None` rejects the token.
    pub profile: Option<UserProfile>,
    /// Token returned by `login`; `None` rejects the credentials.
    pub access_token: Option<String>,
    /// Whether `login` includes the profile in its response.
    pub login_returns_user: bool,
    profile_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockAuthBackend {
    /// A backend that accepts every token and answers with `profile`.
    #[must_use]
    pub fn accepting(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
            ..Self::default()
        }
    }

    /// A backend that rejects every token.
    #[must_use]
    pub fn rejecting() -> Self {
        Self::default()
    }

    /// Accept any credentials, issuing `token`; include the profile in the
    /// login response when `include_user` is set.
    #[must_use]
    pub fn with_login(mut self, token: impl Into<String>, include_user: bool) -> Self {
        self.access_token = Some(token.into());
        self.login_returns_user = include_user;
        self
    }

    /// Number of profile lookups made so far.
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, _req: &LoginRequest) -> Result<LoginResponse> {
        let access_token = self
            .access_token
            .clone()
            .ok_or_else(|| AuthError::LoginFailed("invalid credentials".to_string()))?;
        let user = if self.login_returns_user {
            self.profile.clone()
        } else {
            None
        };
        Ok(LoginResponse { access_token, user })
    }

    async fn fetch_profile(&self, _token: &str) -> Result<UserProfile> {
        self.profile_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.profile
            .clone()
            .ok_or_else(|| AuthError::ProfileFetchFailed("HTTP 401 Unauthorized".to_string()))
    }
}
