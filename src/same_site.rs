use std::fmt;
use std::str::FromStr;

/// The `SameSite` cookie attribute.
///
/// It constrains when the browser attaches the cookie to cross-site requests:
///
/// - `Strict`: never on cross-site requests.
/// - `Lax`: only on cross-site top-level navigations with "safe" methods.
/// - `None`: on every request. Browsers ignore the cookie unless it is also `secure`.
///
/// The token is written verbatim after `SameSite=`, it is never percent-encoded.
///
/// ```rust
/// use amaretti::SameSite;
///
/// assert_eq!(SameSite::Lax.to_string(), "Lax");
/// assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SameSite {
    #[cfg_attr(feature = "serde", serde(alias = "strict"))]
    Strict,
    #[cfg_attr(feature = "serde", serde(alias = "lax"))]
    Lax,
    #[cfg_attr(feature = "serde", serde(alias = "none"))]
    None,
}

impl SameSite {
    /// Returns the attribute token as a string slice.
    pub fn as_str(&self) -> &'static str {
        match *self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = UnknownSameSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("strict") {
            Ok(SameSite::Strict)
        } else if s.eq_ignore_ascii_case("lax") {
            Ok(SameSite::Lax)
        } else if s.eq_ignore_ascii_case("none") {
            Ok(SameSite::None)
        } else {
            Err(UnknownSameSite {
                token: s.to_string(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{token}` is not a valid `SameSite` token. Expected `Strict`, `Lax` or `None`")]
/// The error returned when parsing a [`SameSite`] token fails.
pub struct UnknownSameSite {
    token: String,
}
