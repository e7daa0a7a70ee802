//! Sign-out.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Redirect, Response};
use axum_extra::extract::CookieJar;

use peoplehub_auth::Navigation;

use crate::handlers::with_session_cookies;
use crate::state::GatewayState;

/// `GET /logout` and `POST /logout`
///
/// Expires the session cookie and sends the visitor to the login page.
/// Works with or without a current session.
pub async fn logout(State(state): State<Arc<GatewayState>>, jar: CookieJar) -> Response {
    let (session, _) = state.session_for(&jar);
    let mut navigations = session.navigations();
    session.logout();

    let target = match navigations.try_recv() {
        Ok(Navigation::Login(path)) => path,
        _ => state.guard.login_path().to_string(),
    };
    tracing::info!("User signed out");
    with_session_cookies(&session, Redirect::to(&target))
}
