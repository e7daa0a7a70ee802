//! Create, edit and delete people.
//!
//! Forms are checked by the client before anything is sent; field errors
//! re-render the form with `422`. Rejections from the backend re-render it
//! with the backend's message and status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;

use peoplehub_auth::AuthError;
use peoplehub_core::{PersonForm, ValidationErrors};

use crate::handlers::{backend_failure, enter, PageSession};
use crate::render::{self, PersonFormView};
use crate::state::GatewayState;

const PEOPLE_PATH: &str = "/people";

fn form_page(
    page: &PageSession,
    status: StatusCode,
    view: &PersonFormView<'_>,
) -> Response {
    page.respond((
        status,
        Html(render::person_form_page(page.user.as_ref(), view)),
    ))
}

/// Re-render the form for rejections the user can correct, otherwise fall
/// back to the usual backend failure handling.
fn submit_failure(
    state: &GatewayState,
    page: &PageSession,
    path: &str,
    id: Option<&str>,
    form: &PersonForm,
    err: AuthError,
) -> Response {
    let rerender = |status: StatusCode, errors: Option<&ValidationErrors>, error: Option<&str>| {
        form_page(
            page,
            status,
            &PersonFormView {
                id,
                form,
                errors,
                error,
            },
        )
    };

    match err {
        AuthError::Validation(errors) => {
            rerender(StatusCode::UNPROCESSABLE_ENTITY, Some(&errors), None)
        }
        AuthError::Api { status, message } if status < 500 => {
            tracing::info!(status, message = %message, "Person rejected by backend");
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
            rerender(status, None, Some(&message))
        }
        other => backend_failure(state, page, path, other),
    }
}

/// `GET /people/new`
pub async fn new_page(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
) -> Response {
    match enter(&state, &jar, uri.path()).await {
        Ok(page) => form_page(
            &page,
            StatusCode::OK,
            &PersonFormView {
                id: None,
                form: &PersonForm::default(),
                errors: None,
                error: None,
            },
        ),
        Err(response) => response,
    }
}

/// `POST /people/new`
pub async fn create(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
    Form(form): Form<PersonForm>,
) -> Response {
    let page = match enter(&state, &jar, uri.path()).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    match page.api.create_person(&form).await {
        Ok(person) => {
            tracing::info!(person_id = %person.id, "Person created");
            page.respond(Redirect::to(PEOPLE_PATH))
        }
        Err(e) => submit_failure(&state, &page, uri.path(), None, &form, e),
    }
}

/// `GET /people/:id/edit`
pub async fn edit_page(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
    Path(id): Path<String>,
) -> Response {
    let page = match enter(&state, &jar, uri.path()).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    match page.api.get_person(&id).await {
        Ok(person) => form_page(
            &page,
            StatusCode::OK,
            &PersonFormView {
                id: Some(&person.id),
                form: &PersonForm::from(&person),
                errors: None,
                error: None,
            },
        ),
        Err(e) => backend_failure(&state, &page, uri.path(), e),
    }
}

/// `POST /people/:id/edit`
pub async fn update(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    uri: Uri,
    Path(id): Path<String>,
    Form(form): Form<PersonForm>,
) -> Response {
    let page = match enter(&state, &jar, uri.path()).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    match page.api.update_person(&id, &form).await {
        Ok(person) => {
            tracing::info!(person_id = %person.id, "Person updated");
            page.respond(Redirect::to(PEOPLE_PATH))
        }
        Err(e) => submit_failure(&state, &page, uri.path(), Some(&id), &form, e),
    }
}

/// `POST /people/:id/delete`
///
/// A lost session returns to the people list after signing in again.
pub async fn delete(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let page = match enter(&state, &jar, PEOPLE_PATH).await {
        Ok(page) => page,
        Err(response) => return response,
    };

    match page.api.delete_person(&id).await {
        Ok(()) => {
            tracing::info!(person_id = %id, "Person deleted");
            page.respond(Redirect::to(PEOPLE_PATH))
        }
        Err(e) => backend_failure(&state, &page, PEOPLE_PATH, e),
    }
}
