use std::cmp::Reverse;

use time::OffsetDateTime;

use crate::clock::{Clock, SystemClock};
use crate::expiration::parse_http_date;

/// The cookie store a [`Cookies`] facade reads from and writes to.
///
/// In a browser this is `document.cookie`: reading returns every cookie visible to
/// the page as a single `"; "`-separated string, writing a single assignment
/// (`key=value;path=/;...`) creates, updates or, with an expiry in the past, deletes
/// one cookie.
///
/// Writes are fire-and-forget: a store may silently refuse them (e.g. when cookies
/// are disabled). [`Cookies::enabled`] detects that.
///
/// [`Cookies`]: crate::Cookies
/// [`Cookies::enabled`]: crate::Cookies::enabled
pub trait CookieStore {
    /// The full, current raw cookie string.
    fn read_raw(&self) -> String;

    /// Apply a single cookie assignment.
    fn write_raw(&mut self, assignment: &str);
}

impl<S: CookieStore + ?Sized> CookieStore for &mut S {
    fn read_raw(&self) -> String {
        (**self).read_raw()
    }

    fn write_raw(&mut self, assignment: &str) {
        (**self).write_raw(assignment)
    }
}

impl<S: CookieStore + ?Sized> CookieStore for Box<S> {
    fn read_raw(&self) -> String {
        (**self).read_raw()
    }

    fn write_raw(&mut self, assignment: &str) {
        (**self).write_raw(assignment)
    }
}

/// An in-memory cookie store that behaves like a browser's cookie jar for a single page.
///
/// - A cookie is identified by its key, `path` and `domain`. Writing the same identity
///   again replaces the value in place.
/// - An assignment whose `expires` is not in the future deletes the matching cookie.
/// - Expired cookies are not returned by [`read_raw`](CookieStore::read_raw).
/// - Cookies with longer paths are listed first, then by creation order.
///
/// Keys and values are kept in their encoded form, just like a browser does.
///
/// ```rust
/// use amaretti::{CookieStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.write_raw("a=1;path=/");
/// store.write_raw("b=2;path=/docs");
/// store.write_raw("a=3;path=/");
/// assert_eq!(store.read_raw(), "b=2; a=3");
///
/// store.write_raw("a=;path=/;expires=Thu, 01 Jan 1970 00:00:00 GMT");
/// assert_eq!(store.read_raw(), "b=2");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore<C = SystemClock> {
    cookies: Vec<StoredCookie>,
    clock: C,
    accepts_writes: bool,
}

#[derive(Debug, Clone)]
struct StoredCookie {
    key: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    expires: Option<OffsetDateTime>,
}

impl StoredCookie {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires.map_or(true, |expires| expires > now)
    }
}

impl MemoryStore {
    /// An empty store that uses the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStore<C> {
    /// An empty store that checks expiries against `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            cookies: Vec::new(),
            clock,
            accepts_writes: true,
        }
    }

    /// Silently drop every write, like a browser with cookies disabled.
    pub fn rejecting_writes(mut self) -> Self {
        self.accepts_writes = false;
        self
    }

    /// Number of live cookies.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.cookies.iter().filter(|c| c.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock> CookieStore for MemoryStore<C> {
    fn read_raw(&self) -> String {
        let now = self.clock.now();
        let mut live: Vec<_> = self.cookies.iter().filter(|c| c.is_live(now)).collect();
        // Stable: cookies with the same path length keep their creation order.
        live.sort_by_key(|c| Reverse(c.path.as_deref().map_or(0, str::len)));
        live.iter()
            .map(|c| format!("{}={}", c.key, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn write_raw(&mut self, assignment: &str) {
        if !self.accepts_writes {
            return;
        }

        let mut parts = assignment.split(';');
        let Some((key, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return;
        }

        let mut cookie = StoredCookie {
            key: key.to_string(),
            value: value.to_string(),
            path: None,
            domain: None,
            expires: None,
        };
        for attribute in parts {
            let (name, value) = attribute.split_once('=').unwrap_or((attribute, ""));
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(value.to_string()),
                "domain" => cookie.domain = Some(value.to_string()),
                // An unparsable date is ignored, as browsers do.
                "expires" => cookie.expires = parse_http_date(value),
                _ => {}
            }
        }

        let existing = self.cookies.iter().position(|c| {
            c.key == cookie.key && c.path == cookie.path && c.domain == cookie.domain
        });
        let live = cookie.is_live(self.clock.now());
        match (existing, live) {
            (Some(i), true) => self.cookies[i] = cookie,
            (Some(i), false) => {
                self.cookies.remove(i);
            }
            (None, true) => self.cookies.push(cookie),
            (None, false) => {}
        }
    }
}
