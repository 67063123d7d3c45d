//! Options attached to a cookie write.
//!
//! Check out the [`CookieOptions`] struct for more information.
use crate::{Expires, SameSite};

/// `CookieOptions` specifies the attributes written alongside a cookie.
///
/// The same type plays two roles:
///
/// - the per-call options passed to [`Cookies::set`] and [`Cookies::remove`];
/// - the process-wide defaults stored in [`Cookies::defaults`].
///
/// Each field left unset on a per-call value falls back to the default of the same
/// name. An explicit value, including `Some(false)` for `secure`, always wins.
///
/// ```rust
/// use amaretti::CookieOptions;
///
/// let defaults = CookieOptions::new().set_path("/").set_domain("d").set_secure(true);
/// let merged = CookieOptions::new()
///     .set_path("/x")
///     .set_secure(false)
///     .merged_with_defaults(&defaults);
///
/// assert_eq!(merged.path.as_deref(), Some("/x"));
/// assert_eq!(merged.domain.as_deref(), Some("d"));
/// assert_eq!(merged.secure, Some(false));
/// assert_eq!(merged.expires, None);
/// ```
///
/// # Configuration
///
/// With the `serde` feature enabled, `CookieOptions` can be deserialized, e.g. to load
/// defaults from a configuration file. Missing fields are left unset.
///
/// [`Cookies::set`]: crate::Cookies::set
/// [`Cookies::remove`]: crate::Cookies::remove
/// [`Cookies::defaults`]: crate::Cookies::defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CookieOptions {
    /// The `path` attribute.
    pub path: Option<String>,
    /// The `domain` attribute.
    pub domain: Option<String>,
    /// When the cookie expires. Unset means session cookie.
    pub expires: Option<Expires>,
    /// Whether the `secure` flag is emitted.
    pub secure: Option<bool>,
    /// The `SameSite` attribute.
    ///
    /// The outer `Option` tracks whether the option was specified at all;
    /// `Some(None)` explicitly opts out of a `SameSite` set in the defaults.
    pub same_site: Option<Option<SameSite>>,
}

impl CookieOptions {
    /// Creates an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `path` attribute.
    pub fn set_path<P: Into<String>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `domain` attribute.
    pub fn set_domain<D: Into<String>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the expiry of the cookie.
    ///
    /// ```rust
    /// use amaretti::{CookieOptions, Expires};
    ///
    /// let options = CookieOptions::new().set_expires(3600);
    /// assert_eq!(options.expires, Some(Expires::Seconds(3600)));
    ///
    /// let options = CookieOptions::new().set_expires(Expires::Never);
    /// assert_eq!(options.expires, Some(Expires::Never));
    /// ```
    pub fn set_expires<E: Into<Expires>>(mut self, expires: E) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Sets the `secure` flag. `false` is an explicit value: it overrides a `true` default.
    pub fn set_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets the `SameSite` attribute.
    ///
    /// Passing `None` is an explicit opt-out: it overrides any default.
    ///
    /// ```rust
    /// use amaretti::{CookieOptions, SameSite};
    ///
    /// let defaults = CookieOptions::new().set_same_site(SameSite::Strict);
    ///
    /// let merged = CookieOptions::new().merged_with_defaults(&defaults);
    /// assert_eq!(merged.same_site(), Some(SameSite::Strict));
    ///
    /// let merged = CookieOptions::new().set_same_site(None).merged_with_defaults(&defaults);
    /// assert_eq!(merged.same_site(), None);
    /// ```
    pub fn set_same_site<S: Into<Option<SameSite>>>(mut self, same_site: S) -> Self {
        self.same_site = Some(same_site.into());
        self
    }

    /// The effective `SameSite` attribute, if any.
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site.flatten()
    }

    /// Layer `self` over `defaults`, option by option.
    ///
    /// Neither input is modified.
    pub fn merged_with_defaults(&self, defaults: &CookieOptions) -> CookieOptions {
        CookieOptions {
            path: self.path.clone().or_else(|| defaults.path.clone()),
            domain: self.domain.clone().or_else(|| defaults.domain.clone()),
            expires: self.expires.clone().or_else(|| defaults.expires.clone()),
            secure: self.secure.or(defaults.secure),
            same_site: self.same_site.or(defaults.same_site),
        }
    }
}
