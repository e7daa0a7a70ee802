//! Core types and form validation for peoplehub.
//!
//! This crate provides the foundational types shared by the auth core and the
//! web gateway:
//!
//! - **Domain types**: the authenticated user's profile and person records
//! - **Validation**: field-level checks for the login and person forms
//!
//! # Example
//!
//! ```
//! use peoplehub_core::validation::validate_login_form;
//!
//! assert!(validate_login_form("ada@example.com", "hunter2").is_ok());
//!
//! let errors = validate_login_form("not-an-email", "").unwrap_err();
//! assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
//! assert_eq!(errors.get("password"), Some("This field is required"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, Result};
pub use types::{
    ErrorEvent, EventProject, HealthStatus, PeoplePage, Person, PersonForm, ServiceHealth,
    UserProfile,
};
pub use validation::{FieldError, ValidationErrors};
