//! Route gating.
//!
//! The same allow-list and redirect rules are applied at two points:
//!
//! - [`RouteGuard::edge_check`] runs before any protected content is sent,
//!   using only the raw cookie value.
//! - [`RouteGuard::client_check`] runs after the session has bootstrapped,
//!   using the settled [`AuthState`].
//!
//! Neither check mutates anything; the same inputs always give the same
//! decision.

use crate::session::AuthState;
use crate::token;

/// Login page used when none (or an unusable one) is configured.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Paths that never require a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPaths {
    prefixes: Vec<String>,
}

impl PublicPaths {
    /// Build an allow-list from path prefixes.
    ///
    /// Trailing slashes are ignored; `"/"` alone would make every path public
    /// and is dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .filter(|p| p.starts_with('/'))
            .collect();
        Self { prefixes }
    }

    /// Returns `true` if `path` is one of the prefixes or lies beneath one.
    ///
    /// Matching is per segment: `/login` covers `/login` and `/login/reset`
    /// but not `/loginx`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// The configured prefixes.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new([DEFAULT_LOGIN_PATH])
    }
}

/// Where to send an unauthenticated visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// The login page path.
    pub login_path: String,
    /// The path the visitor asked for.
    pub from: String,
    /// Whether a session existed but had expired.
    pub expired: bool,
}

impl LoginRedirect {
    /// The redirect target, `/login?from=<path>[&expired=true]`.
    #[must_use]
    pub fn target(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("from", &self.from);
        if self.expired {
            query.append_pair("expired", "true");
        }
        format!("{}?{}", self.login_path, query.finish())
    }
}

/// Decision of the edge check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Serve the requested content.
    Allow,
    /// Send the visitor to the login page.
    Redirect(LoginRedirect),
}

/// Decision of the client check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientDecision {
    /// The session is still bootstrapping; show a placeholder only.
    Loading,
    /// Render the protected content.
    Allow,
    /// Send the visitor to the login page.
    Redirect(LoginRedirect),
}

/// Route guard shared by the edge and client checks.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    public: PublicPaths,
    login_path: String,
}

impl RouteGuard {
    /// Create a guard redirecting to `login_path`.
    ///
    /// The login path is always added to the allow-list, so the guard can
    /// never redirect the login page to itself.
    ///
    /// `login_path` is normalised to a single leading slash and no trailing
    /// slash. A path that normalises to `/` (or to nothing) would put every
    /// page behind a redirect to itself, so [`DEFAULT_LOGIN_PATH`] is used
    /// instead.
    pub fn new(public: PublicPaths, login_path: impl Into<String>) -> Self {
        let login_path = normalize_login_path(&login_path.into());
        let public = if public.contains(&login_path) {
            public
        } else {
            let mut prefixes = public.prefixes;
            prefixes.push(login_path.clone());
            PublicPaths::new(prefixes)
        };
        Self { public, login_path }
    }

    /// The allow-list in force.
    #[must_use]
    pub fn public_paths(&self) -> &PublicPaths {
        &self.public
    }

    /// The login page path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Returns `true` if `path` needs no session.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.contains(path)
    }

    fn redirect(&self, from: &str, expired: bool) -> LoginRedirect {
        LoginRedirect {
            login_path: self.login_path.clone(),
            from: from.to_string(),
            expired,
        }
    }

    /// Decide on a request for `path` carrying `cookie`, at time `now`.
    #[must_use]
    pub fn edge_check_at(&self, path: &str, cookie: Option<&str>, now: i64) -> GuardDecision {
        if self.is_public(path) {
            return GuardDecision::Allow;
        }

        let Some(token) = cookie.filter(|c| !c.is_empty()) else {
            tracing::debug!(path = %path, "No session cookie");
            return GuardDecision::Redirect(self.redirect(path, false));
        };

        if let Err(e) = token::check_expiry_at(token, now) {
            tracing::debug!(path = %path, error = %e, "Session cookie rejected");
            return GuardDecision::Redirect(self.redirect(path, true));
        }

        GuardDecision::Allow
    }

    /// Decide on a request for `path` carrying `cookie`.
    #[must_use]
    pub fn edge_check(&self, path: &str, cookie: Option<&str>) -> GuardDecision {
        self.edge_check_at(path, cookie, token::now())
    }

    /// Decide whether to render `path` given the session state.
    #[must_use]
    pub fn client_check(&self, path: &str, state: &AuthState) -> ClientDecision {
        if self.is_public(path) {
            return ClientDecision::Allow;
        }
        match state {
            AuthState::Checking => ClientDecision::Loading,
            AuthState::Unauthenticated => ClientDecision::Redirect(self.redirect(path, false)),
            AuthState::Authenticated { .. } => ClientDecision::Allow,
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new(PublicPaths::default(), DEFAULT_LOGIN_PATH)
    }
}

fn normalize_login_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        tracing::warn!(login_path = %path, "Unusable login path, using default");
        return DEFAULT_LOGIN_PATH.to_string();
    }
    format!("/{trimmed}")
}

/// Where to go after signing in, given the requested `from`.
///
/// Only same-site absolute paths are kept. Anything else becomes `/`: other
/// origins, protocol-relative `//host` and `/\host` forms, and any value with
/// control characters (browsers drop tab, CR and LF while parsing, which
/// would turn `/<TAB>/host` into `//host`).
#[must_use]
pub fn return_path(from: Option<&str>) -> String {
    match from {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control)
                && reqwest::header::HeaderValue::from_str(path).is_ok() =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_profile, token_expiring_at};

    const NOW: i64 = 1_750_000_000;

    #[test]
    fn public_paths_match_per_segment() {
        let public = PublicPaths::new(["/login", "/help/"]);
        assert!(public.contains("/login"));
        assert!(public.contains("/login/reset"));
        assert!(!public.contains("/loginx"));
        assert!(public.contains("/help"));
        assert!(public.contains("/help/faq"));
        assert!(!public.contains("/people"));
        assert!(!public.contains("/"));
    }

    #[test]
    fn root_prefix_is_ignored() {
        let public = PublicPaths::new(["/", "login"]);
        assert!(public.prefixes().is_empty());
        assert!(!public.contains("/people"));
    }

    #[test]
    fn guard_always_allows_its_login_page() {
        let guard = RouteGuard::new(PublicPaths::new(Vec::<String>::new()), "/signin");
        assert!(guard.is_public("/signin"));
        assert_eq!(guard.edge_check_at("/signin", None, NOW), GuardDecision::Allow);
        assert_eq!(
            guard.client_check("/signin", &AuthState::Unauthenticated),
            ClientDecision::Allow
        );
    }

    #[test]
    fn login_path_is_normalised() {
        let guard = RouteGuard::new(PublicPaths::default(), "signin/");
        assert_eq!(guard.login_path(), "/signin");
        assert!(guard.is_public("/signin"));

        for unusable in ["/", "", "  ", "//"] {
            let guard = RouteGuard::new(PublicPaths::new(Vec::<String>::new()), unusable);
            assert_eq!(guard.login_path(), DEFAULT_LOGIN_PATH, "{unusable:?}");
            assert_eq!(
                guard.edge_check_at("/login", None, NOW),
                GuardDecision::Allow
            );
        }
    }

    #[test]
    fn return_path_keeps_local_paths() {
        assert_eq!(return_path(Some("/people")), "/people");
        assert_eq!(return_path(Some("/people?q=ada")), "/people?q=ada");
        assert_eq!(return_path(Some("/people/7/edit")), "/people/7/edit");
    }

    #[test]
    fn return_path_rejects_offsite_targets() {
        assert_eq!(return_path(None), "/");
        assert_eq!(return_path(Some("")), "/");
        assert_eq!(return_path(Some("people")), "/");
        assert_eq!(return_path(Some("https://evil.example")), "/");
        assert_eq!(return_path(Some("//evil.example")), "/");
        assert_eq!(return_path(Some("/\\evil.example")), "/");
        assert_eq!(return_path(Some("/\t/evil.example")), "/");
        assert_eq!(return_path(Some("/\r\n/evil.example")), "/");
    }

    #[test]
    fn return_path_rejects_control_characters() {
        assert_eq!(return_path(Some("/people\n")), "/");
        assert_eq!(return_path(Some("/people\u{0}")), "/");
        assert_eq!(return_path(Some("/people\u{7f}")), "/");
    }

    #[test]
    fn missing_cookie_redirects() {
        let guard = RouteGuard::default();
        let decision = guard.edge_check_at("/people", None, NOW);
        let GuardDecision::Redirect(redirect) = decision else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.from, "/people");
        assert!(!redirect.expired);
        assert_eq!(redirect.target(), "/login?from=%2Fpeople");
    }

    #[test]
    fn empty_cookie_is_missing() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.edge_check_at("/people", Some(""), NOW),
            guard.edge_check_at("/people", None, NOW)
        );
    }

    #[test]
    fn expired_cookie_redirects_with_flag() {
        let guard = RouteGuard::default();
        let token = token_expiring_at(NOW - 10);
        let GuardDecision::Redirect(redirect) = guard.edge_check_at("/people", Some(&token), NOW)
        else {
            panic!("expected redirect");
        };
        assert!(redirect.expired);
        assert_eq!(redirect.target(), "/login?from=%2Fpeople&expired=true");
    }

    #[test]
    fn malformed_cookie_counts_as_expired() {
        let guard = RouteGuard::default();
        let GuardDecision::Redirect(redirect) =
            guard.edge_check_at("/people", Some("not-a-token"), NOW)
        else {
            panic!("expected redirect");
        };
        assert!(redirect.expired);
    }

    #[test]
    fn valid_cookie_allows() {
        let guard = RouteGuard::default();
        let token = token_expiring_at(NOW + 3600);
        assert_eq!(
            guard.edge_check_at("/people", Some(&token), NOW),
            GuardDecision::Allow
        );
    }

    #[test]
    fn public_path_allows_without_cookie() {
        let guard = RouteGuard::default();
        assert_eq!(guard.edge_check_at("/login", None, NOW), GuardDecision::Allow);
        assert_eq!(
            guard.edge_check_at("/login", Some("garbage"), NOW),
            GuardDecision::Allow
        );
    }

    #[test]
    fn edge_check_is_repeatable() {
        let guard = RouteGuard::default();
        let valid = token_expiring_at(NOW + 60);
        let expired = token_expiring_at(NOW - 60);
        let inputs: [(&str, Option<&str>); 5] = [
            ("/people", None),
            ("/people", Some(&valid)),
            ("/people", Some(&expired)),
            ("/login", None),
            ("/monitoring", Some("x.y")),
        ];

        for (path, cookie) in inputs {
            let first = guard.edge_check_at(path, cookie, NOW);
            let second = guard.edge_check_at(path, cookie, NOW);
            assert_eq!(first, second, "{path} {cookie:?}");
        }
    }

    #[test]
    fn redirect_target_encodes_query_paths() {
        let redirect = LoginRedirect {
            login_path: "/login".into(),
            from: "/people?q=a b&x=1".into(),
            expired: false,
        };
        assert_eq!(
            redirect.target(),
            "/login?from=%2Fpeople%3Fq%3Da+b%26x%3D1"
        );
    }

    #[test]
    fn client_check_follows_state() {
        let guard = RouteGuard::default();
        assert_eq!(
            guard.client_check("/people", &AuthState::Checking),
            ClientDecision::Loading
        );
        assert_eq!(
            guard.client_check(
                "/people",
                &AuthState::Authenticated {
                    user: Some(sample_profile())
                }
            ),
            ClientDecision::Allow
        );

        let ClientDecision::Redirect(redirect) =
            guard.client_check("/people", &AuthState::Unauthenticated)
        else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.target(), "/login?from=%2Fpeople");
    }
}
