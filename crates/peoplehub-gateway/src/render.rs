//! HTML page rendering.
//!
//! Pages are small enough to build as strings; every interpolated value goes
//! through [`escape`].

use std::fmt::Write as _;

use peoplehub_core::{
    ErrorEvent, EventProject, HealthStatus, Person, PersonForm, UserProfile, ValidationErrors,
};

/// Message shown when the login page is reached with `expired=true`.
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Message shown when the event feed cannot be loaded.
pub const MONITORING_FAILED: &str = "Failed to fetch monitoring data.";

/// Escape text for inclusion in HTML content or a quoted attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    layout_with_head(title, "", body)
}

fn layout_with_head(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n{head}\
         <title>{} | HR Management System</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

/// Path of a person's page under `/people`, with the ID encoded as one segment.
#[must_use]
pub fn person_path(id: &str, action: &str) -> String {
    format!("/people/{}/{action}", urlencoding::encode(id))
}

fn field_error(errors: Option<&ValidationErrors>, field: &str) -> String {
    errors
        .and_then(|e| e.get(field))
        .map(|m| format!("<p class=\"field-error\">{}</p>", escape(m)))
        .unwrap_or_default()
}

fn nav(user: Option<&UserProfile>) -> String {
    let who = user.map_or_else(|| "Signed in".to_string(), |u| escape(&u.display_name()));
    format!(
        "<header><nav><a href=\"/\">Home</a> <a href=\"/people\">People</a> \
         <a href=\"/monitoring\">Monitoring</a></nav>\
         <span class=\"user\">{who}</span>\
         <form method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form>\
         </header>"
    )
}

/// State of the login form when (re)rendered.
#[derive(Debug, Default)]
pub struct LoginView<'a> {
    /// Where to go after signing in.
    pub from: Option<&'a str>,
    /// Show the session-expired notice.
    pub expired: bool,
    /// Previously entered email.
    pub email: &'a str,
    /// Error reported by the backend.
    pub error: Option<&'a str>,
    /// Field-level validation messages.
    pub errors: Option<&'a ValidationErrors>,
}

/// Render the login page.
#[must_use]
pub fn login_page(login_path: &str, view: &LoginView<'_>) -> String {
    let mut body = String::from("<main><h1>HR Management System</h1><p>Sign in to access your account</p>");

    if view.expired {
        let _ = write!(body, "<div role=\"alert\" class=\"notice\">{SESSION_EXPIRED}</div>");
    }
    if let Some(error) = view.error {
        let _ = write!(body, "<div role=\"alert\" class=\"error\">{}</div>", escape(error));
    }

    let _ = write!(
        body,
        "<form method=\"post\" action=\"{action}\">\
         <label for=\"email\">Email</label>\
         <input id=\"email\" name=\"email\" type=\"email\" value=\"{email}\" autocomplete=\"email\" required>{email_error}\
         <label for=\"password\">Password</label>\
         <input id=\"password\" name=\"password\" type=\"password\" autocomplete=\"current-password\" required>{password_error}",
        action = escape(login_path),
        email = escape(view.email),
        email_error = field_error(view.errors, "email"),
        password_error = field_error(view.errors, "password"),
    );
    if let Some(from) = view.from {
        let _ = write!(
            body,
            "<input type=\"hidden\" name=\"from\" value=\"{}\">",
            escape(from)
        );
    }
    body.push_str("<button type=\"submit\">Sign in</button></form></main>");

    layout("Sign in", &body)
}

/// Render the home page.
#[must_use]
pub fn home_page(user: Option<&UserProfile>) -> String {
    let greeting = user.map_or_else(String::new, |u| format!(", {}", escape(&u.first_name)));
    let body = format!(
        "{}<main><h1>Welcome{greeting}</h1>\
         <p><a href=\"/people\">Manage people</a></p></main>",
        nav(user)
    );
    layout("Home", &body)
}

/// Render the people list, with the search box prefilled with `query`.
#[must_use]
pub fn people_page(user: Option<&UserProfile>, people: &[Person], query: &str) -> String {
    let mut body = nav(user);
    let _ = write!(
        body,
        "<main><h1>People</h1>\
         <form method=\"get\" action=\"/people\">\
         <input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search people\">\
         </form>\
         <p><a href=\"/people/new\">Add person</a></p>",
        escape(query)
    );

    if people.is_empty() {
        body.push_str("<p class=\"empty\">No people found.</p>");
    } else {
        body.push_str(
            "<table><thead><tr><th>Name</th><th>Email</th><th>Position</th><th>Department</th><th></th></tr></thead><tbody>",
        );
        for person in people {
            let _ = write!(
                body,
                "<tr data-id=\"{}\"><td>{} {}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td><a href=\"{}\">Edit</a>{}</td></tr>",
                escape(&person.id),
                escape(&person.first_name),
                escape(&person.last_name),
                escape(&person.email),
                escape(&person.position),
                escape(&person.department),
                escape(&person_path(&person.id, "edit")),
                delete_button(&person.id, &format!("{} {}", person.first_name, person.last_name)),
            );
        }
        body.push_str("</tbody></table>");
    }
    body.push_str("</main>");

    layout("People", &body)
}

fn delete_button(id: &str, name: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\" class=\"inline\">\
         <button type=\"submit\" aria-label=\"Delete {}\">Delete</button></form>",
        escape(&person_path(id, "delete")),
        escape(name),
    )
}

/// State of the create or edit person form.
#[derive(Debug)]
pub struct PersonFormView<'a> {
    /// ID of the person being edited, or `None` when creating.
    pub id: Option<&'a str>,
    /// Field values to show.
    pub form: &'a PersonForm,
    /// Field-level validation messages.
    pub errors: Option<&'a ValidationErrors>,
    /// Error reported by the backend.
    pub error: Option<&'a str>,
}

/// Render the create or edit person form.
#[must_use]
pub fn person_form_page(user: Option<&UserProfile>, view: &PersonFormView<'_>) -> String {
    let (title, action, submit) = match view.id {
        Some(id) => ("Edit Person", person_path(id, "edit"), "Update Person"),
        None => ("Add New Person", "/people/new".to_string(), "Create Person"),
    };

    let mut body = nav(user);
    let _ = write!(
        body,
        "<main><p><a href=\"/people\">Back to People</a></p><h1>{title}</h1>"
    );
    if let Some(error) = view.error {
        let _ = write!(body, "<div role=\"alert\" class=\"error\">{}</div>", escape(error));
    }

    let _ = write!(body, "<form method=\"post\" action=\"{}\">", escape(&action));
    let fields = [
        ("firstName", "First Name", "text", view.form.first_name.as_str()),
        ("lastName", "Last Name", "text", view.form.last_name.as_str()),
        ("email", "Email", "email", view.form.email.as_str()),
        ("position", "Position", "text", view.form.position.as_str()),
        ("department", "Department", "text", view.form.department.as_str()),
    ];
    for (name, label, kind, value) in fields {
        let _ = write!(
            body,
            "<label for=\"{name}\">{label}</label>\
             <input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{}\" required>{}",
            escape(value),
            field_error(view.errors, name),
        );
    }
    let _ = write!(
        body,
        "<button type=\"submit\">{submit}</button> <a href=\"/people\">Cancel</a></form>"
    );
    if let Some(id) = view.id {
        let name = format!("{} {}", view.form.first_name, view.form.last_name);
        body.push_str(&delete_button(id, name.trim()));
    }
    body.push_str("</main>");

    layout(title, &body)
}

/// Data for the monitoring dashboard.
#[derive(Debug, Default)]
pub struct MonitoringView<'a> {
    /// Backend health report, if it could be read.
    pub health: Option<&'a HealthStatus>,
    /// Recent error events, or `None` if the feed failed to load.
    pub events: Option<&'a [ErrorEvent]>,
    /// Reload interval in seconds; zero disables it.
    pub refresh_seconds: u64,
}

fn badge(text: &str, ok: bool) -> String {
    let class = if ok { "badge" } else { "badge destructive" };
    format!("<span class=\"{class}\">{}</span>", escape(text))
}

/// Render the monitoring dashboard.
#[must_use]
pub fn monitoring_page(user: Option<&UserProfile>, view: &MonitoringView<'_>) -> String {
    let mut body = nav(user);
    body.push_str("<main><h1>Monitoring Dashboard</h1><p>Real-time application monitoring</p>");
    if view.events.is_none() {
        let _ = write!(body, "<div role=\"alert\" class=\"error\">{MONITORING_FAILED}</div>");
    }

    let status = view.health.map_or("Unknown", |h| h.status.as_str());
    let database = view
        .health
        .and_then(|h| h.services.database.as_deref())
        .unwrap_or("Unknown");
    let api = view
        .health
        .and_then(|h| h.services.api.as_deref())
        .unwrap_or("Unknown");
    let checked = view
        .health
        .and_then(|h| h.timestamp.as_deref())
        .unwrap_or_default();
    let _ = write!(
        body,
        "<section id=\"health\"><h2>System Health</h2><p>{} <time>{}</time></p>\
         <dl><dt>Database</dt><dd>{}</dd><dt>API</dt><dd>{}</dd></dl></section>",
        badge(status, view.health.is_some_and(HealthStatus::is_healthy)),
        escape(checked),
        badge(database, database == "connected"),
        badge(api, api == "running"),
    );

    let events = view.events.unwrap_or_default();
    let occurrences: u64 = events.iter().map(|e| e.count).sum();
    let mut projects: Vec<&str> = events
        .iter()
        .filter_map(|e| e.project.as_ref().map(EventProject::name))
        .collect();
    projects.sort_unstable();
    projects.dedup();
    let _ = write!(
        body,
        "<section id=\"metrics\"><h2>Application Metrics</h2><dl>\
         <dt>Events</dt><dd>{}</dd><dt>Occurrences</dt><dd>{occurrences}</dd>\
         <dt>Projects</dt><dd>{}</dd></dl></section>",
        events.len(),
        projects.len(),
    );

    body.push_str("<section id=\"events\"><h2>Recent Errors</h2>");
    if events.is_empty() {
        body.push_str("<p class=\"empty\">No recent errors</p>");
    } else {
        body.push_str("<ul>");
        for event in events {
            body.push_str(&event_item(event));
        }
        body.push_str("</ul>");
    }
    body.push_str("</section></main>");

    let head = if view.refresh_seconds > 0 {
        format!("<meta http-equiv=\"refresh\" content=\"{}\">\n", view.refresh_seconds)
    } else {
        String::new()
    };
    layout_with_head("Monitoring", &head, &body)
}

fn event_item(event: &ErrorEvent) -> String {
    let message = if event.message.is_empty() {
        &event.title
    } else {
        &event.message
    };
    let mut item = format!(
        "<li data-id=\"{}\"><span class=\"badge destructive\">Error</span> <strong>{}</strong>",
        escape(&event.id),
        escape(message)
    );
    if let Some(project) = &event.project {
        let _ = write!(item, " <span class=\"badge outline\">{}</span>", escape(project.name()));
    }
    if let Some(environment) = &event.environment {
        let _ = write!(item, " <span class=\"badge secondary\">{}</span>", escape(environment));
    }
    let _ = write!(
        item,
        "<p>{} | Count: {}",
        escape(event.last_seen.as_deref().unwrap_or_default()),
        event.count
    );
    // Only web links; anything else is shown as text.
    match event.url.as_deref() {
        Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
            let _ = write!(
                item,
                " | <a href=\"{0}\" target=\"_blank\" rel=\"noopener noreferrer\">{0}</a>",
                escape(url)
            );
        }
        Some(url) => {
            let _ = write!(item, " | {}", escape(url));
        }
        None => {}
    }
    item.push_str("</p></li>");
    item
}

/// Render the placeholder shown while a session is being checked.
#[must_use]
pub fn loading_page() -> String {
    layout("Loading", "<main><p>Loading...</p></main>")
}

/// Render an error page.
#[must_use]
pub fn error_page(message: &str) -> String {
    layout(
        "Error",
        &format!("<main><h1>Something went wrong</h1><p>{}</p></main>", escape(message)),
    )
}
