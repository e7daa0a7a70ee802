//! Protected read-only pages.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{Html, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::handlers::{backend_failure, enter};
use crate::render::{self, MonitoringView};
use crate::state::GatewayState;

/// Query parameters of the people list.
#[derive(Debug, Default, Deserialize)]
pub struct PeopleQuery {
    /// Free-text search.
    pub q: Option<String>,
}

/// `GET /`
pub async fn home(State(state): State<Arc<GatewayState>>, jar: CookieJar, uri: Uri) -> Response {
    match enter(&state, &jar, uri.path()).await {
        Ok(page) => page.respond(Html(render::home_page(page.user.as_ref()))),
        Err(response) => response,
    }
}

/// `GET /people?q=`
pub async fn people(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
    Query(query): Query<PeopleQuery>,
) -> Response {
    let page = match enter(&state, &jar, uri.path()).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    let q = query.q.unwrap_or_default();
    match page.api.list_people(Some(&q)).await {
        Ok(people) => page.respond(Html(render::people_page(page.user.as_ref(), &people, &q))),
        Err(e) => backend_failure(&state, &page, uri.path(), e),
    }
}

/// `GET /monitoring`
///
/// Health and events are fetched together. A failed health check shows as
/// unknown; a failed event feed shows a notice. Either one rejecting the
/// session signs it out.
pub async fn monitoring(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
) -> Response {
    let page = match enter(&state, &jar, uri.path()).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    let (health, events) = tokio::join!(page.api.backend_health(), page.api.list_events());

    let health = match health {
        Ok(health) => Some(health),
        Err(e) if e.is_session_loss() => return backend_failure(&state, &page, uri.path(), e),
        Err(e) => {
            tracing::warn!(error = %e, "Backend health unavailable");
            None
        }
    };
    let events = match events {
        Ok(events) => Some(events),
        Err(e) if e.is_session_loss() => return backend_failure(&state, &page, uri.path(), e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch monitoring data");
            None
        }
    };

    let view = MonitoringView {
        health: health.as_ref(),
        events: events.as_deref(),
        refresh_seconds: state.config.monitoring_refresh_seconds,
    };
    page.respond(Html(render::monitoring_page(page.user.as_ref(), &view)))
}
