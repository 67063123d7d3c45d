use anyhow::Context;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::format_description::FormatItem;
use time::macros::{datetime, format_description};
use time::parsing::Parsed;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// The latest expiry a cookie can carry: `Fri, 31 Dec 9999 23:59:59 GMT`.
///
/// RFC 6265 requires dates not to exceed 9999 years. [`Expires::Never`] resolves
/// to this date, and any later date is clamped to it.
pub const MAX_EXPIRES: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

// From http://tools.ietf.org/html/rfc2616#section-3.3.1.
static HTTP_DATE: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year padding:none] [hour]:[minute]:[second] GMT"
);
static HTTP_DATE_INPUT: &[FormatItem<'_>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);
static US_DATE: &[FormatItem<'_>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");
static ISO_DATE: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");
static ISO_LOCAL_DATETIME: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// The `expires` option of a cookie write.
///
/// Leaving `expires` unset on [`CookieOptions`] produces a session cookie.
/// Every other form is turned into an absolute date by [`Expires::resolve`].
///
/// ```rust
/// use amaretti::Expires;
/// use amaretti::time::macros::datetime;
///
/// let now = datetime!(2013-01-01 00:00:00 UTC);
/// assert_eq!(
///     Expires::from(5).resolve(now).unwrap(),
///     datetime!(2013-01-01 00:00:05 UTC)
/// );
/// assert_eq!(
///     Expires::from("Wed, 21 Oct 2015 07:28:00 GMT").resolve(now).unwrap(),
///     datetime!(2015-10-21 07:28:00 UTC)
/// );
/// assert!(Expires::from("not-a-date").resolve(now).is_err());
/// ```
///
/// [`CookieOptions`]: crate::CookieOptions
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Expires {
    /// Expire this many seconds after "now". Negative values point to the past.
    ///
    /// Offsets past the end of the calendar saturate to [`MAX_EXPIRES`].
    Seconds(i64),
    /// Never expire, within practical limits: resolves to [`MAX_EXPIRES`].
    Never,
    /// A date to be parsed when the cookie is written.
    ///
    /// Understood formats:
    ///
    /// - RFC 3339, e.g. `2015-10-21T07:28:00Z`
    /// - HTTP-date, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`
    /// - RFC 2822, e.g. `Wed, 21 Oct 2015 07:28:00 +0000`
    /// - ISO 8601 without an offset, e.g. `2015-10-21T07:28:00` or `2015-10-21`
    /// - `month/day/year`, e.g. `10/21/2015`
    ///
    /// Dates without an offset are taken to be in UTC. A date without a time is midnight.
    Date(String),
    /// An absolute point in time.
    At(#[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))] OffsetDateTime),
}

impl Expires {
    /// Resolve `self` into an absolute, UTC point in time.
    ///
    /// `now` is the reference for [`Expires::Seconds`].
    /// The outcome is clamped to [`MAX_EXPIRES`].
    pub fn resolve(&self, now: OffsetDateTime) -> Result<OffsetDateTime, InvalidExpiry> {
        let resolved = match self {
            Expires::Seconds(seconds) => match now.checked_add(Duration::seconds(*seconds)) {
                Some(resolved) => resolved,
                None if *seconds > 0 => MAX_EXPIRES,
                None => {
                    let source = anyhow::anyhow!("{seconds}s from now predates the calendar");
                    return Err(InvalidExpiry { source });
                }
            },
            Expires::Never => MAX_EXPIRES,
            Expires::Date(raw) => parse_date(raw)?,
            Expires::At(at) => *at,
        };
        // Compared as instants, before the offset change can leave the calendar.
        Ok(std::cmp::min(resolved, MAX_EXPIRES).to_offset(UtcOffset::UTC))
    }
}

impl From<i64> for Expires {
    fn from(seconds: i64) -> Self {
        Expires::Seconds(seconds)
    }
}

impl From<i32> for Expires {
    fn from(seconds: i32) -> Self {
        Expires::Seconds(seconds.into())
    }
}

impl From<OffsetDateTime> for Expires {
    fn from(at: OffsetDateTime) -> Self {
        Expires::At(at)
    }
}

impl From<&str> for Expires {
    fn from(raw: &str) -> Self {
        Expires::Date(raw.to_owned())
    }
}

impl From<String> for Expires {
    fn from(raw: String) -> Self {
        Expires::Date(raw)
    }
}

/// Resolve an optional `expires` option.
///
/// `None` stays `None`: the cookie is a session cookie and no `expires` attribute is emitted.
pub fn resolve_expiry(
    expires: Option<&Expires>,
    now: OffsetDateTime,
) -> Result<Option<OffsetDateTime>, InvalidExpiry> {
    expires.map(|expires| expires.resolve(now)).transpose()
}

/// Format `time` as an HTTP-date, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
pub(crate) fn format_http_date(time: OffsetDateTime) -> Result<String, time::error::Format> {
    time.to_offset(UtcOffset::UTC).format(&HTTP_DATE)
}

/// Parse an HTTP-date, as found in the `expires` attribute of a cookie assignment.
///
/// The weekday must match the date.
pub(crate) fn parse_http_date(raw: &str) -> Option<OffsetDateTime> {
    let mut parsed = Parsed::new();
    let rest = parsed
        .parse_items(raw.trim().as_bytes(), HTTP_DATE_INPUT)
        .ok()?;
    if !rest.is_empty() {
        return None;
    }
    let weekday = parsed.weekday()?;
    let date = PrimitiveDateTime::try_from(parsed).ok()?;
    (date.weekday() == weekday).then(|| date.assume_utc())
}

fn parse_date(raw: &str) -> Result<OffsetDateTime, InvalidExpiry> {
    let raw = raw.trim();
    if let Ok(date) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date);
    }
    if let Some(date) = parse_http_date(raw) {
        return Ok(date);
    }
    if let Ok(date) = PrimitiveDateTime::parse(raw, &ISO_LOCAL_DATETIME) {
        return Ok(date.assume_utc());
    }
    if let Ok(date) = Date::parse(raw, &ISO_DATE).or_else(|_| Date::parse(raw, &US_DATE)) {
        return Ok(date.midnight().assume_utc());
    }
    OffsetDateTime::parse(raw, &Rfc2822)
        .with_context(|| format!("`{raw}` is not a recognised date"))
        .map_err(|source| InvalidExpiry { source })
}

#[derive(Debug, thiserror::Error)]
#[error("`expires` cannot be converted to a valid date")]
/// The `expires` option of a cookie write does not denote a valid point in time.
pub struct InvalidExpiry {
    #[source]
    source: anyhow::Error,
}

#[cfg(test)]
mod tests {
    use super::{format_http_date, parse_http_date, resolve_expiry, Expires, MAX_EXPIRES};
    use googletest::prelude::*;
    use time::macros::datetime;

    #[test]
    fn seconds_are_relative_to_now() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        assert_eq!(
            Expires::Seconds(5).resolve(now).unwrap(),
            datetime!(2013-01-01 00:00:05 UTC)
        );
        assert_eq!(
            Expires::Seconds(-1).resolve(now).unwrap(),
            datetime!(2012-12-31 23:59:59 UTC)
        );
    }

    #[test]
    fn never_resolves_to_the_sentinel() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        assert_eq!(Expires::Never.resolve(now).unwrap(), MAX_EXPIRES);
        assert_eq!(
            format_http_date(MAX_EXPIRES).unwrap(),
            "Fri, 31 Dec 9999 23:59:59 GMT"
        );
    }

    #[test]
    fn dates_are_parsed_in_several_formats() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        let expected = datetime!(2015-10-21 07:28:00 UTC);
        for raw in [
            "2015-10-21T07:28:00Z",
            "2015-10-21T09:28:00+02:00",
            "Wed, 21 Oct 2015 07:28:00 GMT",
            "Wed, 21 Oct 2015 07:28:00 +0000",
            "2015-10-21T07:28:00",
        ] {
            assert_eq!(
                Expires::from(raw).resolve(now).unwrap(),
                expected,
                "{raw}"
            );
        }
    }

    #[test]
    fn dates_without_a_time_are_midnight_utc() {
        let now = datetime!(2012-06-01 00:00:00 UTC);
        let expected = datetime!(2013-01-01 00:00:00 UTC);
        for raw in [
            "01/01/2013",
            "1/1/2013",
            "2013-01-01",
            "2013-01-01T00:00:00",
        ] {
            assert_eq!(
                Expires::from(raw).resolve(now).unwrap(),
                expected,
                "{raw}"
            );
        }
    }

    #[test]
    fn http_dates_with_the_wrong_weekday_are_rejected() {
        // 1 January 2013 was a Tuesday.
        assert_eq!(
            parse_http_date("Tue, 01 Jan 2013 00:00:00 GMT"),
            Some(datetime!(2013-01-01 00:00:00 UTC))
        );
        assert_eq!(parse_http_date("Mon, 01 Jan 2013 00:00:00 GMT"), None);
        assert_eq!(parse_http_date("Tue, 01 Jan 2013 00:00:00 GMT; x"), None);

        let now = datetime!(2012-06-01 00:00:00 UTC);
        assert_that!(
            Expires::from("Mon, 01 Jan 2013 00:00:00 GMT").resolve(now),
            err(displays_as(eq("`expires` cannot be converted to a valid date")))
        );
    }

    #[test]
    fn absolute_dates_are_normalised_to_utc() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        let at = datetime!(2015-10-21 09:28:00 +2);
        let resolved = Expires::At(at).resolve(now).unwrap();
        assert_eq!(resolved, datetime!(2015-10-21 07:28:00 UTC));
        assert!(resolved.offset().is_utc());
    }

    #[test]
    fn invalid_expiries_are_rejected() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        let cases = [
            Expires::from("not-a-date"),
            Expires::from(""),
            Expires::from("13/01/2013"),
            Expires::Seconds(i64::MIN),
        ];
        for expires in cases {
            assert_that!(
                expires.resolve(now),
                err(displays_as(eq("`expires` cannot be converted to a valid date")))
            );
        }
    }

    #[test]
    fn absent_expiry_is_a_session_cookie() {
        let now = datetime!(2013-01-01 00:00:00 UTC);
        assert_eq!(resolve_expiry(None, now).unwrap(), None);
        assert_eq!(
            resolve_expiry(Some(&Expires::Seconds(60)), now).unwrap(),
            Some(datetime!(2013-01-01 00:01:00 UTC))
        );
    }

    #[test]
    fn far_future_dates_are_clamped() {
        let now = datetime!(9999-12-31 23:00:00 UTC);
        assert_eq!(Expires::Seconds(7200).resolve(now).unwrap(), MAX_EXPIRES);

        let now = datetime!(2013-01-01 00:00:00 UTC);
        assert_eq!(Expires::Seconds(i64::MAX).resolve(now).unwrap(), MAX_EXPIRES);
        assert_eq!(
            Expires::At(datetime!(9999-12-31 23:00:00 -5)).resolve(now).unwrap(),
            MAX_EXPIRES
        );
    }
}
