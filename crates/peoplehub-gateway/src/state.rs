//! Gateway application state.

use std::sync::Arc;

use axum_extra::extract::CookieJar;

use peoplehub_auth::{
    ApiClient, AuthSession, CredentialStore, PublicPaths, RequestCookies, RouteGuard,
};

use crate::config::GatewayConfig;

/// A session bound to the cookies of one request.
pub type RequestSession = AuthSession<ApiClient, RequestCookies>;

/// Shared application state for the gateway.
#[derive(Clone)]
pub struct GatewayState {
    /// Backend API client, without credentials.
    pub api: ApiClient,
    /// Route guard shared by the edge middleware and the page handlers.
    pub guard: RouteGuard,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl GatewayState {
    /// Create the gateway state from configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let api = ApiClient::new(config.auth.clone());
        let guard = RouteGuard::new(
            PublicPaths::new(&config.public_paths),
            config.login_path.clone(),
        );
        Self { api, guard, config }
    }

    /// Open a session over the cookies of the current request.
    ///
    /// Returns the session and an API client that authenticates with its token.
    #[must_use]
    pub fn session_for(&self, jar: &CookieJar) -> (RequestSession, ApiClient) {
        let cookies = RequestCookies::new(
            jar.iter()
                .map(|c| (c.name().to_owned(), c.value().to_owned())),
        );
        let store = Arc::new(CredentialStore::new(cookies));
        let api = self.api.with_credentials(store.clone());
        let session = AuthSession::new(Arc::new(api.clone()), store)
            .with_login_path(self.guard.login_path());
        (session, api)
    }
}
