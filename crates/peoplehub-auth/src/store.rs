//! Credential storage.
//!
//! The session token lives in two places: an `auth-token` cookie that the
//! network edge can read, and an in-memory mirror used for outgoing API
//! requests. [`CredentialStore`] owns both and is the only writer, so the two
//! copies cannot drift apart.

use std::collections::HashMap;

use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use parking_lot::Mutex;

use crate::token;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth-token";

/// Lifetime of the session cookie, independent of the token's own `exp`.
pub const AUTH_COOKIE_MAX_AGE_SECS: i64 = 86_400;

/// Build the session cookie for `token`.
///
/// `auth-token=<token>; SameSite=Strict; Path=/; Max-Age=86400`
#[must_use]
pub fn auth_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_owned()))
        .path("/")
        .max_age(Duration::seconds(AUTH_COOKIE_MAX_AGE_SECS))
        .same_site(SameSite::Strict)
        .build()
}

/// Build a cookie that removes the session cookie immediately.
#[must_use]
pub fn expired_auth_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .same_site(SameSite::Strict)
        .build()
}

/// Returns `true` if writing `cookie` at `now` deletes it rather than storing it.
fn removes_cookie(cookie: &Cookie<'_>, now: i64) -> bool {
    if let Some(max_age) = cookie.max_age() {
        return max_age.whole_seconds() <= 0;
    }
    cookie
        .expires_datetime()
        .is_some_and(|at| at.unix_timestamp() <= now)
}

/// Absolute expiry (Unix seconds) of a cookie written at `now`, if any.
fn expires_at(cookie: &Cookie<'_>, now: i64) -> Option<i64> {
    match cookie.max_age() {
        Some(max_age) => Some(now.saturating_add(max_age.whole_seconds())),
        None => cookie.expires_datetime().map(OffsetDateTime::unix_timestamp),
    }
}

/// Client-side cookie storage.
pub trait CookieStorage: Send + Sync {
    /// Read the current value of a cookie, if present and unexpired.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie. A cookie whose expiry has passed removes the entry.
    fn set(&self, cookie: Cookie<'static>);
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: Option<i64>,
}

/// An in-process cookie jar that honours `Max-Age` and `Expires`.
///
/// This plays the role of the browser's jar for a client running outside a
/// browser, and in tests.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookies {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cookie as of `now` (Unix seconds).
    #[must_use]
    pub fn get_at(&self, name: &str, now: i64) -> Option<String> {
        let mut cookies = self.cookies.lock();
        let live = cookies
            .get(name)
            .is_some_and(|c| c.expires_at.map_or(true, |at| at > now));
        if live {
            cookies.get(name).map(|c| c.value.clone())
        } else {
            cookies.remove(name);
            None
        }
    }

    /// Write a cookie as of `now` (Unix seconds).
    pub fn set_at(&self, cookie: &Cookie<'_>, now: i64) {
        let mut cookies = self.cookies.lock();
        if removes_cookie(cookie, now) {
            cookies.remove(cookie.name());
            return;
        }
        cookies.insert(
            cookie.name().to_owned(),
            StoredCookie {
                value: cookie.value().to_owned(),
                expires_at: expires_at(cookie, now),
            },
        );
    }
}

impl CookieStorage for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.get_at(name, token::now())
    }

    fn set(&self, cookie: Cookie<'static>) {
        self.set_at(&cookie, token::now());
    }
}

/// Cookies of a single incoming HTTP request.
///
/// Reads see the request's `Cookie` header as modified by writes made while
/// handling it; every write is also queued as an outgoing `Set-Cookie`.
#[derive(Debug, Default)]
pub struct RequestCookies {
    inner: Mutex<RequestCookiesInner>,
}

#[derive(Debug, Default)]
struct RequestCookiesInner {
    values: HashMap<String, String>,
    outgoing: Vec<Cookie<'static>>,
}

impl RequestCookies {
    /// Seed from the request's cookie name/value pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Mutex::new(RequestCookiesInner {
                values,
                outgoing: Vec::new(),
            }),
        }
    }

    /// Parse a raw `Cookie` request header. Unparseable pairs are skipped.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        Self::new(
            Cookie::split_parse(header)
                .filter_map(std::result::Result::ok)
                .map(|c| (c.name().to_owned(), c.value().to_owned())),
        )
    }

    /// Cookies written so far, in write order.
    #[must_use]
    pub fn outgoing(&self) -> Vec<Cookie<'static>> {
        self.inner.lock().outgoing.clone()
    }

    /// Drain the cookies written so far.
    #[must_use]
    pub fn take_outgoing(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.inner.lock().outgoing)
    }
}

impl CookieStorage for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.inner.lock().values.get(name).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) {
        let mut inner = self.inner.lock();
        if removes_cookie(&cookie, token::now()) {
            inner.values.remove(cookie.name());
        } else {
            inner
                .values
                .insert(cookie.name().to_owned(), cookie.value().to_owned());
        }
        inner.outgoing.push(cookie);
    }
}

/// Read access to the current session token.
pub trait TokenSource: Send + Sync {
    /// The current token, if a session is present.
    fn token(&self) -> Option<String>;
}

/// Owner of the session token: cookie plus in-memory mirror.
///
/// `set_token` and `clear_token` are the only write paths; each updates the
/// cookie and the mirror under a single lock.
#[derive(Debug)]
pub struct CredentialStore<C: CookieStorage> {
    cookies: C,
    mirror: Mutex<Option<String>>,
}

impl<C: CookieStorage> CredentialStore<C> {
    /// Create a store over `cookies`, loading any token already present.
    pub fn new(cookies: C) -> Self {
        let mirror = Mutex::new(read_cookie(&cookies));
        Self { cookies, mirror }
    }

    /// Store `token` in the cookie and the mirror.
    pub fn set_token(&self, token: &str) {
        let mut mirror = self.mirror.lock();
        self.cookies.set(auth_cookie(token));
        *mirror = Some(token.to_owned());
        tracing::debug!("Session token stored");
    }

    /// Expire the cookie and drop the mirror.
    pub fn clear_token(&self) {
        let mut mirror = self.mirror.lock();
        self.cookies.set(expired_auth_cookie());
        *mirror = None;
        tracing::debug!("Session token cleared");
    }

    /// The current token, if any.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.mirror.lock().clone()
    }

    /// Re-read the cookie into the mirror and return the token.
    ///
    /// The cookie is authoritative on reload: it may have been written or
    /// expired outside this process.
    pub fn reload(&self) -> Option<String> {
        let mut mirror = self.mirror.lock();
        *mirror = read_cookie(&self.cookies);
        mirror.clone()
    }

    /// The underlying cookie storage.
    #[must_use]
    pub fn cookies(&self) -> &C {
        &self.cookies
    }
}

impl<C: CookieStorage> TokenSource for CredentialStore<C> {
    fn token(&self) -> Option<String> {
        self.get_token()
    }
}

fn read_cookie<C: CookieStorage>(cookies: &C) -> Option<String> {
    cookies.get(AUTH_COOKIE).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookie_attributes() {
        let cookie = auth_cookie("abc.def.ghi");
        assert_eq!(cookie.name(), "auth-token");
        assert_eq!(cookie.value(), "abc.def.ghi");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86_400)));

        let header = cookie.to_string();
        assert!(header.starts_with("auth-token=abc.def.ghi"));
        assert!(header.contains("Max-Age=86400"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn expired_cookie_is_in_the_past() {
        let cookie = expired_auth_cookie();
        assert_eq!(cookie.value(), "");
        assert!(removes_cookie(&cookie, token::now()));
        assert!(cookie.to_string().contains("1970"));
    }

    #[test]
    fn set_then_clear_keeps_mirror_and_cookie_in_step() {
        let store = CredentialStore::new(MemoryCookies::new());
        assert_eq!(store.get_token(), None);

        store.set_token("t1");
        assert_eq!(store.get_token().as_deref(), Some("t1"));
        assert_eq!(store.cookies().get(AUTH_COOKIE).as_deref(), Some("t1"));

        store.clear_token();
        assert_eq!(store.get_token(), None);
        assert_eq!(store.cookies().get(AUTH_COOKIE), None);
    }

    #[test]
    fn new_loads_existing_cookie() {
        let jar = MemoryCookies::new();
        jar.set(auth_cookie("from-earlier"));

        let store = CredentialStore::new(jar);
        assert_eq!(store.get_token().as_deref(), Some("from-earlier"));
        assert_eq!(store.token().as_deref(), Some("from-earlier"));
    }

    #[test]
    fn reload_follows_the_cookie() {
        let store = CredentialStore::new(MemoryCookies::new());
        store.set_token("t1");

        store.cookies().set(expired_auth_cookie());
        assert_eq!(store.get_token().as_deref(), Some("t1"));
        assert_eq!(store.reload(), None);
        assert_eq!(store.get_token(), None);
    }

    #[test]
    fn memory_cookie_expires_after_max_age() {
        let jar = MemoryCookies::new();
        jar.set_at(&auth_cookie("t"), 1_000);

        assert_eq!(jar.get_at(AUTH_COOKIE, 1_000 + 86_399).as_deref(), Some("t"));
        assert_eq!(jar.get_at(AUTH_COOKIE, 1_000 + 86_400), None);
        // Expired entries are dropped.
        assert_eq!(jar.get_at(AUTH_COOKIE, 0), None);
    }

    #[test]
    fn request_cookies_record_writes() {
        let jar = RequestCookies::from_header("theme=dark; auth-token=abc");
        assert_eq!(jar.get("theme").as_deref(), Some("dark"));

        let store = CredentialStore::new(jar);
        assert_eq!(store.get_token().as_deref(), Some("abc"));

        store.clear_token();
        assert_eq!(store.cookies().get(AUTH_COOKIE), None);

        let outgoing = store.cookies().take_outgoing();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].name(), AUTH_COOKIE);
        assert!(removes_cookie(&outgoing[0], token::now()));
        assert!(store.cookies().outgoing().is_empty());
    }

    #[test]
    fn empty_cookie_value_is_no_token() {
        let store = CredentialStore::new(RequestCookies::new([(AUTH_COOKIE, "")]));
        assert_eq!(store.get_token(), None);
    }
}
