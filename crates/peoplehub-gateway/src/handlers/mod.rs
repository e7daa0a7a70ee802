//! HTTP request handlers.
//!
//! Page handlers open a session over the request's own cookies and confirm
//! it with the backend before anything is rendered. Cookies the session
//! writes (an expired token being cleared, for instance) are sent back with
//! the response, whether it is the page or a redirect.

pub mod health;
pub mod login;
pub mod logout;
pub mod pages;
pub mod people;

use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use peoplehub_auth::{ApiClient, AuthError, ClientDecision, LoginRedirect};
use peoplehub_core::UserProfile;

use crate::error::ApiError;
use crate::render;
use crate::state::{GatewayState, RequestSession};

/// Attach every cookie the session wrote during this request to `response`.
pub(crate) fn with_session_cookies(
    session: &RequestSession,
    response: impl IntoResponse,
) -> Response {
    let jar = session
        .store()
        .cookies()
        .take_outgoing()
        .into_iter()
        .fold(CookieJar::new(), CookieJar::add);
    (jar, response).into_response()
}

/// A confirmed session for the current request.
pub(crate) struct PageSession {
    pub session: RequestSession,
    pub api: ApiClient,
    pub user: Option<UserProfile>,
}

impl PageSession {
    /// Send `response` with the session's cookies.
    pub fn respond(&self, response: impl IntoResponse) -> Response {
        with_session_cookies(&self.session, response)
    }
}

/// Confirm the session for `path`, or produce the response to send instead.
#[allow(clippy::result_large_err)]
pub(crate) async fn enter(
    state: &GatewayState,
    jar: &CookieJar,
    path: &str,
) -> Result<PageSession, Response> {
    let (session, api) = state.session_for(jar);
    let auth = session.bootstrap().await;

    match state.guard.client_check(path, &auth) {
        ClientDecision::Allow => Ok(PageSession {
            user: auth.user().cloned(),
            session,
            api,
        }),
        ClientDecision::Loading => Err(with_session_cookies(
            &session,
            Html(render::loading_page()),
        )),
        ClientDecision::Redirect(redirect) => {
            tracing::debug!(path = %path, "Session not confirmed");
            Err(with_session_cookies(
                &session,
                Redirect::to(&redirect.target()),
            ))
        }
    }
}

/// Turn a failed backend call into a response, signing out on session loss.
pub(crate) fn backend_failure(
    state: &GatewayState,
    page: &PageSession,
    path: &str,
    err: AuthError,
) -> Response {
    if err.is_session_loss() {
        tracing::info!(path = %path, error = %err, "Session rejected by backend");
        page.session.logout();
        let redirect = LoginRedirect {
            login_path: state.guard.login_path().to_string(),
            from: path.to_string(),
            expired: err.is_expiry(),
        };
        return page.respond(Redirect::to(&redirect.target()));
    }
    page.respond(ApiError::from(err))
}
