//! Page error types and responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use peoplehub_auth::AuthError;
use peoplehub_core::CoreError;

use crate::render;

/// Page error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The backend could not be reached or answered unexpectedly.
    #[error("backend unavailable")]
    BadGateway,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::BadGateway => "bad_gateway",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(code = self.code(), status = %status, "Rendering error page");
        (status, Html(render::error_page(&self.to_string()))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Core(CoreError::PersonNotFound(id)) => Self::NotFound(format!("person {id}")),
            AuthError::Validation(errors) | AuthError::Core(CoreError::Validation(errors)) => {
                Self::BadRequest(errors.to_string())
            }
            AuthError::Api { status, message } if status < 500 => Self::BadRequest(message),
            AuthError::Http(_)
            | AuthError::InvalidResponse(_)
            | AuthError::Api { .. }
            | AuthError::ProfileFetchFailed(_) => {
                tracing::error!(error = %err, "Backend error");
                Self::BadGateway
            }
            AuthError::MalformedToken(_)
            | AuthError::TokenExpired
            | AuthError::LoginFailed(_)
            | AuthError::Unauthorized => {
                tracing::error!(error = %err, "Unhandled auth error");
                Self::Internal("authentication error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::BadGateway.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn from_auth_error() {
        let err = ApiError::from(AuthError::Http("connection refused".into()));
        assert!(matches!(err, ApiError::BadGateway));

        let err = ApiError::from(AuthError::Api {
            status: 409,
            message: "in use".into(),
        });
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "in use"));

        let err = ApiError::from(AuthError::Api {
            status: 503,
            message: "down".into(),
        });
        assert!(matches!(err, ApiError::BadGateway));

        let err = ApiError::from(AuthError::Core(CoreError::PersonNotFound("7".into())));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn renders_html() {
        let response = ApiError::BadGateway.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
    }
}
