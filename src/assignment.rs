use std::borrow::Cow;
use std::fmt;

use time::OffsetDateTime;

use crate::encoding::{encode_key, encode_value};
use crate::expiration::{format_http_date, resolve_expiry, InvalidExpiry};
use crate::{CookieOptions, SameSite};

/// A single cookie write, as assigned to the cookie store.
///
/// Its [`Display`](fmt::Display) implementation produces the wire format:
///
/// ```text
/// <key>=<value>[;path=<path>][;domain=<domain>][;expires=<HTTP-date>][;secure][;SameSite=<token>]
/// ```
///
/// The key and the value are percent-encoded when formatted. The attributes are written
/// as they are.
///
/// ```rust
/// use amaretti::{CookieAssignment, SameSite};
/// use amaretti::time::macros::datetime;
///
/// let assignment = CookieAssignment::new("key", "a value")
///     .set_path("/")
///     .set_expires(datetime!(2013-01-01 00:00:00 UTC))
///     .set_same_site(SameSite::Strict);
/// assert_eq!(
///     assignment.to_string(),
///     "key=a%20value;path=/;expires=Tue, 01 Jan 2013 00:00:00 GMT;SameSite=Strict"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAssignment<'c> {
    pub(crate) key: Cow<'c, str>,
    pub(crate) value: Cow<'c, str>,
    pub(crate) path: Option<Cow<'c, str>>,
    pub(crate) domain: Option<Cow<'c, str>>,
    pub(crate) expires: Option<OffsetDateTime>,
    pub(crate) secure: bool,
    pub(crate) same_site: Option<SameSite>,
}

impl<'c> CookieAssignment<'c> {
    /// Creates a session cookie assignment with no attributes.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        CookieAssignment {
            key: key.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            secure: false,
            same_site: None,
        }
    }

    /// Build an assignment out of a fully merged set of options.
    ///
    /// The `expires` option is resolved against `now`.
    pub fn from_options<K, V>(
        key: K,
        value: V,
        options: &CookieOptions,
        now: OffsetDateTime,
    ) -> Result<Self, InvalidExpiry>
    where
        K: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        let expires = resolve_expiry(options.expires.as_ref(), now)?;
        let mut assignment = CookieAssignment::new(key, value)
            .set_secure(options.secure == Some(true))
            .set_same_site(options.same_site());
        assignment.path = options.path.clone().map(Cow::Owned);
        assignment.domain = options.domain.clone().map(Cow::Owned);
        assignment.expires = expires;
        Ok(assignment)
    }

    /// The unencoded key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The unencoded value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The resolved expiry. `None` for session cookies.
    pub fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the expiry. `None` turns the assignment back into a session cookie.
    pub fn set_expires<T: Into<Option<OffsetDateTime>>>(mut self, expires: T) -> Self {
        self.expires = expires.into();
        self
    }

    pub fn set_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn set_same_site<T: Into<Option<SameSite>>>(mut self, same_site: T) -> Self {
        self.same_site = same_site.into();
        self
    }

    /// An empty `path` or `domain` is left out.
    fn fmt_attributes(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(path) = self.path().filter(|path| !path.is_empty()) {
            write!(f, ";path={}", path)?;
        }

        if let Some(domain) = self.domain().filter(|domain| !domain.is_empty()) {
            write!(f, ";domain={}", domain)?;
        }

        if let Some(expires) = self.expires {
            let expires = format_http_date(expires).map_err(|_| fmt::Error)?;
            write!(f, ";expires={}", expires)?;
        }

        if self.secure {
            write!(f, ";secure")?;
        }

        if let Some(same_site) = self.same_site {
            write!(f, ";SameSite={}", same_site)?;
        }

        Ok(())
    }
}

impl fmt::Display for CookieAssignment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", encode_key(&self.key), encode_value(&self.value))?;
        self.fmt_attributes(f)
    }
}

/// Serialize a key, a value and a merged set of options into the string to assign
/// to the cookie store.
///
/// `now` is the reference point for a relative `expires` option.
///
/// ```rust
/// use amaretti::{encode_cookie_string, CookieOptions};
/// use amaretti::time::OffsetDateTime;
///
/// let options = CookieOptions::new().set_domain("www.scotthamper.com").set_secure(true);
/// let cookie = encode_cookie_string("key", "value", &options, OffsetDateTime::now_utc()).unwrap();
/// assert_eq!(cookie, "key=value;domain=www.scotthamper.com;secure");
/// ```
pub fn encode_cookie_string(
    key: &str,
    value: &str,
    options: &CookieOptions,
    now: OffsetDateTime,
) -> Result<String, InvalidExpiry> {
    CookieAssignment::from_options(key, value, options, now)
        .map(|assignment| assignment.to_string())
}
