//! Domain types exchanged with the backend API.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user ID.
    pub id: String,
    /// Login email address.
    pub email: String,
    /// Role name (e.g. `admin`, `user`).
    pub role: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl UserProfile {
    /// Full name for display, "First Last".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A person record managed by the HR application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Backend person ID.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Job title.
    #[serde(default)]
    pub position: String,
    /// Department name.
    #[serde(default)]
    pub department: String,
}

/// Payload for creating or updating a person.
///
/// Missing fields deserialize as empty so that validation, not parsing,
/// reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonForm {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Job title.
    pub position: String,
    /// Department name.
    pub department: String,
}

impl From<&Person> for PersonForm {
    fn from(person: &Person) -> Self {
        Self {
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            email: person.email.clone(),
            position: person.position.clone(),
            department: person.department.clone(),
        }
    }
}

/// A page of people from the list endpoint.
///
/// The backend paginates; a body without `items` is treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeoplePage {
    /// People on this page.
    #[serde(default)]
    pub items: Vec<Person>,
    /// Total number of matches, if reported.
    #[serde(default)]
    pub total: Option<u64>,
}

/// Project an error event belongs to. The backend sends either the name or
/// a `{ "name": .. }` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EventProject {
    /// Bare project name.
    Name(String),
    /// Project object.
    Object {
        /// Project name.
        name: String,
    },
}

impl EventProject {
    /// The project name, whichever form it came in.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Object { name } => name,
        }
    }
}

/// An error event captured by the backend's monitoring endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    /// Event ID.
    pub id: String,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Deployment environment (e.g. `production`).
    #[serde(default)]
    pub environment: Option<String>,
    /// Page the error happened on.
    #[serde(default)]
    pub url: Option<String>,
    /// Number of occurrences.
    #[serde(default)]
    pub count: u64,
    /// First occurrence, as sent by the backend.
    #[serde(default)]
    pub first_seen: Option<String>,
    /// Latest occurrence, as sent by the backend.
    #[serde(default)]
    pub last_seen: Option<String>,
    /// Owning project.
    #[serde(default)]
    pub project: Option<EventProject>,
}

/// Per-service health reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceHealth {
    /// Database state (`connected` when healthy).
    #[serde(default)]
    pub database: Option<String>,
    /// API state (`running` when healthy).
    #[serde(default)]
    pub api: Option<String>,
}

/// Backend health report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Overall status (`healthy` when everything is up).
    pub status: String,
    /// When the report was produced.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Per-service breakdown.
    #[serde(default)]
    pub services: ServiceHealth,
}

impl HealthStatus {
    /// Returns `true` if the backend reports itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}
