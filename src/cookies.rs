use std::collections::HashMap;
use std::fmt;

use crate::clock::{Clock, SystemClock};
use crate::expiration::InvalidExpiry;
use crate::store::CookieStore;
use crate::{decode_cookie_header, CookieAssignment, CookieOptions, Expires};

/// The key written and removed by [`Cookies::enabled`].
const TEST_KEY: &str = "cookies.js";

/// A cookie API on top of a [`CookieStore`], with a read cache.
///
/// # Reading
///
/// [`Cookies::get`] compares the store's raw cookie string with the one it decoded last
/// time. The string is decoded again only if it changed, so repeated reads are cheap,
/// yet cookies written by other code (another script, the server, the user) are
/// always observed.
///
/// # Writing
///
/// [`Cookies::set`] layers the call-site options over [`Cookies::defaults`], encodes
/// the assignment and hands it to the store. The cache is not touched: the next read
/// will notice that the raw string changed.
///
/// [`Cookies::remove`] is a write with an empty value and an expiry in the past.
///
/// ```rust
/// use amaretti::{CookieOptions, Cookies, MemoryStore};
///
/// # fn main() -> Result<(), amaretti::errors::CookieError> {
/// let mut cookies = Cookies::new(MemoryStore::new());
///
/// cookies
///     .set("name", "a value", None)?
///     .set("visits", 3, CookieOptions::new().set_expires(3600))?;
/// assert_eq!(cookies.get("name"), Some("a value"));
/// assert_eq!(cookies.get("visits"), Some("3"));
///
/// cookies.remove("name", None)?;
/// assert_eq!(cookies.get("name"), None);
/// # Ok(())
/// # }
/// ```
pub struct Cookies<S, C = SystemClock> {
    /// Options applied to every write unless the call overrides them.
    ///
    /// Changing them affects every later [`Cookies::set`] and [`Cookies::remove`].
    pub defaults: CookieOptions,
    store: S,
    clock: C,
    cache: Cache,
    enabled: Option<bool>,
}

#[derive(Default)]
struct Cache {
    /// `None` until the first read.
    raw: Option<String>,
    /// Valid only while `raw` matches the store.
    cookies: HashMap<String, String>,
}

impl<S: CookieStore> Cookies<S, SystemClock> {
    /// Creates a facade over `store`, with `path=/` as the only default.
    pub fn new(store: S) -> Self {
        Cookies::with_clock(store, SystemClock)
    }
}

impl<S: CookieStore, C: Clock> Cookies<S, C> {
    /// Creates a facade over `store` that resolves relative expiries against `clock`.
    pub fn with_clock(store: S, clock: C) -> Self {
        Cookies {
            defaults: CookieOptions::new().set_path("/"),
            store,
            clock,
            cache: Cache::default(),
            enabled: None,
        }
    }

    /// Replaces the default options.
    pub fn with_defaults(mut self, defaults: CookieOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the value of the cookie named `key`, if there is one.
    ///
    /// If several cookies share that name, the one listed first by the store wins.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.refresh_cache();
        self.cache.cookies.get(key).map(String::as_str)
    }

    /// Writes a cookie.
    ///
    /// `value` is written in its [`Display`](fmt::Display) form. `options` are layered
    /// over [`Cookies::defaults`]; pass `None` to use the defaults as they are.
    ///
    /// Returns `self`, to chain calls.
    ///
    /// # Errors
    ///
    /// Fails if `key` is empty or if the merged `expires` option is not a valid date.
    /// Nothing is written in that case.
    pub fn set<V, O>(
        &mut self,
        key: &str,
        value: V,
        options: O,
    ) -> Result<&mut Self, CookieError>
    where
        V: fmt::Display,
        O: Into<Option<CookieOptions>>,
    {
        let value = value.to_string();
        self.write(key, Some(&value), options.into())
    }

    /// Deletes a cookie by writing it with an empty value and an expiry in the past.
    ///
    /// Any `expires` in `options` or in the defaults is ignored. `path` and `domain`
    /// must match the ones the cookie was written with.
    pub fn remove<O>(&mut self, key: &str, options: O) -> Result<&mut Self, CookieError>
    where
        O: Into<Option<CookieOptions>>,
    {
        self.write(key, None, options.into())
    }

    /// Whether the store actually keeps cookies.
    ///
    /// Some environments silently drop cookie writes (private browsing, disabled cookies).
    /// The first call writes a test cookie, reads it back and removes it; the outcome
    /// is remembered for the lifetime of `self`.
    pub fn enabled(&mut self) -> bool {
        if let Some(enabled) = self.enabled {
            return enabled;
        }
        let enabled = self.check_enabled();
        self.enabled = Some(enabled);
        enabled
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, mutably. Writes made through it are picked up by the next read.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes `self`, returning the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// A write with no value is a deletion.
    fn write(
        &mut self,
        key: &str,
        value: Option<&str>,
        options: Option<CookieOptions>,
    ) -> Result<&mut Self, CookieError> {
        if key.is_empty() {
            return Err(CookieError::EmptyKey);
        }

        let mut options = options
            .unwrap_or_default()
            .merged_with_defaults(&self.defaults);
        if value.is_none() {
            options.expires = Some(Expires::Seconds(-1));
        }

        let now = self.clock.now();
        let assignment = CookieAssignment::from_options(key, value.unwrap_or(""), &options, now)?;
        self.store.write_raw(&assignment.to_string());
        Ok(self)
    }

    /// Returns `true` if the raw cookie string had to be decoded again.
    fn refresh_cache(&mut self) -> bool {
        let raw = self.store.read_raw();
        if self.cache.raw.as_deref() == Some(raw.as_str()) {
            return false;
        }

        self.cache.cookies = decode_cookie_header(&raw);
        self.cache.raw = Some(raw);
        tracing::debug!(
            n_cookies = self.cache.cookies.len(),
            "The cookie string changed, rebuilt the cache"
        );
        true
    }

    fn check_enabled(&mut self) -> bool {
        let enabled = match self.set(TEST_KEY, 1, None) {
            Ok(cookies) => cookies.get(TEST_KEY) == Some("1"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to write the test cookie");
                false
            }
        };
        if let Err(e) = self.remove(TEST_KEY, None) {
            tracing::warn!(error = %e, "Failed to remove the test cookie");
        }
        tracing::debug!(enabled, "Checked whether the cookie store accepts writes");
        enabled
    }
}

#[cfg(feature = "serde")]
impl<S: CookieStore, C: Clock> Cookies<S, C> {
    /// Returns the value of the cookie named `key`, parsed as JSON.
    ///
    /// ```rust
    /// use amaretti::{Cookies, MemoryStore};
    ///
    /// # fn main() -> Result<(), amaretti::errors::CookieError> {
    /// let mut cookies = Cookies::new(MemoryStore::new());
    /// cookies.set_json("cart", &vec![1, 2, 3], None)?;
    /// assert_eq!(cookies.get_json::<Vec<u32>>("cart")?, Some(vec![1, 2, 3]));
    /// assert_eq!(cookies.get_json::<Vec<u32>>("missing")?, None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_json<T>(&mut self, key: &str) -> Result<Option<T>, CookieError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get(key)
            .map(|value| serde_json::from_str(value))
            .transpose()
            .map_err(CookieError::Json)
    }

    /// Serializes `value` as JSON and writes it as a cookie.
    pub fn set_json<T, O>(
        &mut self,
        key: &str,
        value: &T,
        options: O,
    ) -> Result<&mut Self, CookieError>
    where
        T: serde::Serialize + ?Sized,
        O: Into<Option<CookieOptions>>,
    {
        let value = serde_json::to_string(value).map_err(CookieError::Json)?;
        self.set(key, value, options)
    }
}

impl<S: fmt::Debug, C> fmt::Debug for Cookies<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookies")
            .field("defaults", &self.defaults)
            .field("store", &self.store)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`Cookies::set`] and [`Cookies::remove`].
pub enum CookieError {
    #[error(transparent)]
    InvalidExpiry(#[from] InvalidExpiry),
    #[error("The key of a cookie cannot be empty")]
    EmptyKey,
    #[cfg(feature = "serde")]
    #[error("Failed to convert a structured cookie value to or from JSON")]
    Json(#[source] serde_json::Error),
}
