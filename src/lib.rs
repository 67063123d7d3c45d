//! Read and write the cookies visible to a web page.
//!
//! # Overview
//!
//! A page sees its cookies through a single string-valued store (`document.cookie` in a
//! browser): reading it returns every cookie as `key=value` pairs joined by `"; "`,
//! assigning to it creates, updates or deletes one cookie at a time.
//!
//! `amaretti` puts a small, typed API on top of that store:
//!
//! - Reading individual cookies, via [`Cookies::get`], with a cache that is rebuilt only
//!   when the raw cookie string changes
//! - Writing cookies with structured options (path, domain, expiry, secure, same-site),
//!   via [`Cookies::set`]
//! - Deleting cookies, via [`Cookies::remove`]
//! - Detecting environments that silently drop cookies, via [`Cookies::enabled`]
//!
//! Keys and values are percent-encoded following RFC 6265: characters that are legal in a
//! cookie value (e.g. `/`, `:`, `=`, `@`) are left readable, `%` is always escaped so that
//! decoding is unambiguous.
//!
//! # Non-goals
//!
//! `amaretti` is not a cookie jar. It does not store cookies for multiple domains nor
//! persist them across requests: it only sees the cookie string exposed to the current page.
//!
//! # Quickstart
//!
//! ```rust
//! use amaretti::{CookieOptions, Cookies, Expires, MemoryStore, SameSite};
//!
//! # fn main() -> Result<(), amaretti::errors::CookieError> {
//! // `MemoryStore` behaves like a browser cookie store. In a browser, implement
//! // `CookieStore` on top of `document.cookie`.
//! let mut cookies = Cookies::new(MemoryStore::new());
//! // Defaults apply to every write, unless the call overrides them.
//! cookies.defaults = CookieOptions::new()
//!     .set_path("/")
//!     .set_same_site(SameSite::Lax);
//!
//! cookies
//!     .set("theme", "dark", None)?
//!     .set("token", "a/b=c", CookieOptions::new().set_expires(Expires::Never).set_secure(true))?;
//!
//! assert_eq!(cookies.get("theme"), Some("dark"));
//! assert_eq!(cookies.get("token"), Some("a/b=c"));
//!
//! cookies.remove("theme", None)?;
//! assert_eq!(cookies.get("theme"), None);
//! # Ok(())
//! # }
//! ```
//!
//! # Codec
//!
//! The encoder and the decoder are usable on their own:
//!
//! ```rust
//! use amaretti::{decode_cookie_header, encode_cookie_string, CookieOptions};
//! use amaretti::time::OffsetDateTime;
//!
//! let assignment = encode_cookie_string(
//!     "a key",
//!     "#$&+/:<=>?@[]^`{|}~%",
//!     &CookieOptions::new().set_path("/"),
//!     OffsetDateTime::now_utc(),
//! )
//! .unwrap();
//! assert_eq!(assignment, "a%20key=#$&+/:<=>?@[]^`{|}~%25;path=/");
//!
//! let cookies = decode_cookie_header("a%20key=#$&+/:<=>?@[]^`{|}~%25; k=a; k=b");
//! assert_eq!(cookies["a key"], "#$&+/:<=>?@[]^`{|}~%");
//! assert_eq!(cookies["k"], "a");
//! ```
//!
//! ## Credits
//!
//! The encoding sets and the attribute formatting follow the approach of the
//! [`biscotti`](https://crates.io/crates/biscotti) and
//! [`cookie`](https://crates.io/crates/cookie) crates.

mod assignment;
mod clock;
mod cookies;
mod encoding;
mod expiration;
mod header;
pub mod options;
mod same_site;
mod store;

pub use crate::expiration::{resolve_expiry, Expires, MAX_EXPIRES};
pub use crate::same_site::*;
pub use assignment::{encode_cookie_string, CookieAssignment};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cookies::Cookies;
pub use header::decode_cookie_header;
pub use options::CookieOptions;
pub use store::{CookieStore, MemoryStore};
pub use time;

/// Errors that can occur when using `amaretti`.
pub mod errors {
    pub use crate::cookies::CookieError;
    pub use crate::expiration::InvalidExpiry;
    pub use crate::same_site::UnknownSameSite;
}
