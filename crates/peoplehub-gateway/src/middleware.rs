//! Edge session check.
//!
//! Runs before any page handler and only inspects the `auth-token` cookie
//! locally. The backend is not consulted here; handlers confirm the session.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use peoplehub_auth::{GuardDecision, AUTH_COOKIE};

use crate::state::GatewayState;

/// Redirect requests for protected pages without a live session cookie to the
/// login page.
pub async fn edge_guard(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let cookie = jar.get(AUTH_COOKIE).map(Cookie::value);

    match state.guard.edge_check(path, cookie) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(redirect) => {
            tracing::debug!(
                path = %redirect.from,
                expired = redirect.expired,
                "Edge redirect to login"
            );
            Redirect::to(&redirect.target()).into_response()
        }
    }
}
