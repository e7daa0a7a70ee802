//! Router configuration.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, login, logout, pages, people};
use crate::middleware::edge_guard;
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Unguarded
/// - `GET /health` - Health check
/// - `GET|POST /logout` - End the session
///
/// ## Pages (edge check)
/// - `GET /login` - Login page (public path)
/// - `POST /login` - Submit credentials
/// - `GET /` - Home
/// - `GET /people` - People list, `?q=` to search
/// - `GET|POST /people/new` - Add a person
/// - `GET|POST /people/:id/edit` - Edit a person
/// - `POST /people/:id/delete` - Delete a person
/// - `GET /monitoring` - Monitoring dashboard, reloading itself
pub fn create_router(state: GatewayState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();
    let login_path = state.guard.login_path().to_string();

    let state = Arc::new(state);

    let pages = Router::new()
        .route(&login_path, get(login::page).post(login::submit))
        .route("/", get(pages::home))
        .route("/people", get(pages::people))
        .route("/people/new", get(people::new_page).post(people::create))
        .route("/people/:id/edit", get(people::edit_page).post(people::update))
        .route("/people/:id/delete", post(people::delete))
        .route("/monitoring", get(pages::monitoring))
        .route_layer(middleware::from_fn_with_state(state.clone(), edge_guard));

    Router::new()
        .route("/health", get(health::health))
        .route("/logout", get(logout::logout).post(logout::logout))
        .merge(pages)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_bytes))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
