use std::collections::HashMap;

use crate::encoding::decode;

/// Parse the raw cookie string exposed by the cookie store into a key→value map.
///
/// Entries are separated by `"; "`. Each entry is split on its **first** `=`, so
/// values can contain `=`. An entry without `=` is a key with an empty value.
/// Keys and values are percent-decoded.
///
/// The first occurrence of a key wins: browsers list the cookie with the most
/// specific path first.
///
/// Entries that fail to decode, or whose key is empty, are skipped: a malformed
/// cookie written by some other script must not prevent reading the others.
///
/// ```rust
/// use amaretti::decode_cookie_header;
///
/// let cookies = decode_cookie_header("key=value; other=a%20b; key=shadowed; %D0%EE=bad");
/// assert_eq!(cookies.len(), 2);
/// assert_eq!(cookies["key"], "value");
/// assert_eq!(cookies["other"], "a b");
/// ```
pub fn decode_cookie_header(raw: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    if raw.is_empty() {
        return cookies;
    }

    for fragment in raw.split("; ") {
        let (key, value) = fragment.split_once('=').unwrap_or((fragment, ""));

        let key = match decode(key) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(fragment, error = %e, "Skipping a cookie with an undecodable key");
                continue;
            }
        };
        if key.is_empty() {
            continue;
        }
        if cookies.contains_key(key.as_ref()) {
            continue;
        }

        let value = match decode(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(fragment, error = %e, "Skipping a cookie with an undecodable value");
                continue;
            }
        };
        cookies.insert(key.into_owned(), value.into_owned());
    }

    cookies
}
