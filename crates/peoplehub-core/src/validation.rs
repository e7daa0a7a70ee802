//! Client-side form validation.
//!
//! Validators return the user-facing message for a failing field, or `None`
//! when the value is acceptable. Form-level validators collect those messages
//! into [`ValidationErrors`], keyed by field name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::PersonForm;

/// Message for an empty required field.
pub const REQUIRED: &str = "This field is required";

/// Message for a malformed email address.
pub const INVALID_EMAIL: &str = "Please enter a valid email address";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name (e.g. `email`).
    pub field: String,
    /// User-facing message.
    pub message: String,
}

/// Field-keyed validation failures for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`, keeping the first one if already set.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` for `field` if present.
    pub fn check(&mut self, field: &str, message: Option<String>) {
        if let Some(message) = message {
            self.add(field, message);
        }
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Returns `true` if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over failing fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = FieldError> + '_ {
        self.fields.iter().map(|(field, message)| FieldError {
            field: field.clone(),
            message: message.clone(),
        })
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (i, (field, message)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check that `value` is a plausible email address.
#[must_use]
pub fn validate_email(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(REQUIRED.to_string());
    }
    if !EMAIL_RE.is_match(value) {
        return Some(INVALID_EMAIL.to_string());
    }
    None
}

/// Check that `value` has non-whitespace content.
#[must_use]
pub fn validate_required(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(REQUIRED.to_string())
    } else {
        None
    }
}

/// Check that `value` has at least `min` characters.
#[must_use]
pub fn validate_min_length(value: &str, min: usize) -> Option<String> {
    if value.chars().count() < min {
        Some(format!("Must be at least {min} characters"))
    } else {
        None
    }
}

/// Validate the login form.
///
/// # Errors
///
/// Returns the failing fields (`email`, `password`).
pub fn validate_login_form(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("email", validate_email(email));
    errors.check("password", validate_required(password));
    errors.into_result()
}

/// Validate the create/edit person form.
///
/// # Errors
///
/// Returns the failing fields, keyed by their camelCase form names.
pub fn validate_person_form(form: &PersonForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("firstName", validate_required(&form.first_name));
    errors.check("lastName", validate_required(&form.last_name));
    errors.check("email", validate_email(&form.email));
    errors.check("position", validate_required(&form.position));
    errors.check("department", validate_required(&form.department));
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert_eq!(validate_email("").as_deref(), Some(REQUIRED));
        assert_eq!(validate_email("plain").as_deref(), Some(INVALID_EMAIL));
        assert_eq!(validate_email("a@b").as_deref(), Some(INVALID_EMAIL));
        assert_eq!(validate_email("a b@c.com").as_deref(), Some(INVALID_EMAIL));
        assert_eq!(validate_email("a@b.com"), None);
        assert_eq!(validate_email("first.last@sub.example.org"), None);
    }

    #[test]
    fn required_rejects_whitespace() {
        assert_eq!(validate_required("   ").as_deref(), Some(REQUIRED));
        assert_eq!(validate_required(" x "), None);
    }

    #[test]
    fn min_length_counts_chars() {
        assert_eq!(
            validate_min_length("abc", 4).as_deref(),
            Some("Must be at least 4 characters")
        );
        assert_eq!(validate_min_length("éééé", 4), None);
    }

    #[test]
    fn login_form_collects_both_fields() {
        let errors = validate_login_form("", " ").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some(REQUIRED));
        assert_eq!(errors.get("password"), Some(REQUIRED));
        assert_eq!(
            errors.to_string(),
            "validation failed: email: This field is required; password: This field is required"
        );
    }

    #[test]
    fn person_form() {
        let mut form = PersonForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            position: "Engineer".into(),
            department: "R&D".into(),
        };
        assert!(validate_person_form(&form).is_ok());

        form.email = "nope".into();
        form.department = String::new();
        let errors = validate_person_form(&form).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["department", "email"]);
    }

    #[test]
    fn first_message_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.get("email"), Some("first"));
    }
}
