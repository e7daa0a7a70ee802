//! Authentication error types.

use thiserror::Error;

use peoplehub_core::{CoreError, ValidationErrors};

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur in the auth core and the backend client.
///
/// None of these reach the UI directly: the session state machine absorbs
/// token and profile failures into the unauthenticated state.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token cannot be decoded or carries no usable `exp` claim.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token decoded but its `exp` claim has passed.
    #[error("token expired")]
    TokenExpired,

    /// The backend was unreachable or rejected the token during profile lookup.
    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    /// The backend rejected the submitted credentials.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login form failed client-side validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The backend rejected the bearer token on an API call.
    #[error("unauthorized")]
    Unauthorized,

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or a generic fallback.
        message: String,
    },

    /// A domain-level error reported by the backend.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Http(String),

    /// The response body could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Returns `true` if this error means the current session is no longer usable
    /// and the user must sign in again.
    #[must_use]
    pub const fn is_session_loss(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::TokenExpired
                | Self::ProfileFetchFailed(_)
                | Self::Unauthorized
        )
    }

    /// Returns `true` if the login screen should report the session as expired
    /// rather than simply missing.
    #[must_use]
    pub const fn is_expiry(&self) -> bool {
        matches!(self, Self::MalformedToken(_) | Self::TokenExpired)
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MalformedToken(_)
            | Self::TokenExpired
            | Self::ProfileFetchFailed(_)
            | Self::LoginFailed(_)
            | Self::Unauthorized => 401,
            Self::Validation(_) | Self::Core(CoreError::Validation(_)) => 422,
            Self::Core(CoreError::PersonNotFound(_)) => 404,
            Self::Api { status, .. } => *status,
            Self::Http(_) | Self::InvalidResponse(_) => 502,
        }
    }
}
