//! Login page and credential submission.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use peoplehub_auth::{return_path, AuthError, Navigation};

use crate::handlers::with_session_cookies;
use crate::render::{self, LoginView};
use crate::state::GatewayState;

const SIGN_IN_FAILED: &str = "Unable to sign in. Please try again later.";

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Page to return to after signing in.
    pub from: Option<String>,
    /// `"true"` when the previous session expired.
    pub expired: Option<String>,
}

/// Submitted login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Page to return to after signing in.
    pub from: Option<String>,
}

/// `GET /login`
pub async fn page(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let view = LoginView {
        from: query.from.as_deref(),
        expired: query.expired.as_deref() == Some("true"),
        ..LoginView::default()
    };
    Html(render::login_page(state.guard.login_path(), &view))
}

/// `POST /login`
///
/// On success the session cookie is set and the visitor is sent to the page
/// they originally asked for. Failures re-render the form.
pub async fn submit(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (session, _) = state.session_for(&jar);
    let mut navigations = session.navigations();

    match session
        .sign_in(&form.email, &form.password, form.from.as_deref())
        .await
    {
        Ok(()) => {
            let target = match navigations.try_recv() {
                Ok(Navigation::Path(path)) => return_path(Some(&path)),
                _ => return_path(form.from.as_deref()),
            };
            tracing::info!(redirect_to = %target, "User signed in");
            with_session_cookies(&session, Redirect::to(&target))
        }
        Err(e) => {
            let mut view = LoginView {
                from: form.from.as_deref(),
                email: &form.email,
                ..LoginView::default()
            };
            let status = match &e {
                AuthError::Validation(errors) => {
                    view.errors = Some(errors);
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AuthError::LoginFailed(message) => {
                    view.error = Some(message.as_str());
                    StatusCode::UNAUTHORIZED
                }
                other => {
                    tracing::warn!(error = %other, "Sign-in failed");
                    view.error = Some(SIGN_IN_FAILED);
                    StatusCode::from_u16(other.http_status_code())
                        .unwrap_or(StatusCode::BAD_GATEWAY)
                }
            };
            (
                status,
                Html(render::login_page(state.guard.login_path(), &view)),
            )
                .into_response()
        }
    }
}
