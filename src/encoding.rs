use std::borrow::Cow;

use anyhow::Context;
use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC};

/// Characters left readable in a cookie key.
///
/// This is the `encodeURIComponent` set (alphanumerics plus `-_.!~*'`) widened with the
/// RFC 6265 token characters that URI-component escaping would needlessly touch
/// (`#$&+^` and `` ` ``, `|`). `(` and `)` stay escaped: they are token separators.
/// https://www.rfc-editor.org/rfc/rfc6265#section-4.1.1
const KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'^')
    .remove(b'`')
    .remove(b'|');

/// Characters escaped in a cookie value: everything outside of `cookie-octet`, plus `%`
/// so that decoding stays unambiguous.
/// https://www.rfc-editor.org/rfc/rfc6265#section-4.1.1
const VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\');

/// Percent-encode a cookie key.
pub(crate) fn encode_key(key: &str) -> impl std::fmt::Display + '_ {
    percent_encoding::utf8_percent_encode(key, KEY)
}

/// Percent-encode a cookie value, leaving every RFC 6265 `cookie-octet` except `%` as is.
pub(crate) fn encode_value(value: &str) -> impl std::fmt::Display + '_ {
    percent_encoding::utf8_percent_encode(value, VALUE)
}

/// Percent-decode a cookie key or value.
///
/// Unlike [`percent_encoding::percent_decode`], a `%` that isn't followed by two
/// hex digits is rejected rather than passed through.
pub(crate) fn decode(raw: &str) -> Result<Cow<'_, str>, DecodingError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes
                .get(i + 1..i + 3)
                .is_some_and(|digits| digits.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return Err(DecodingError {
                    raw_value: raw.to_string(),
                    source: anyhow::anyhow!("Malformed percent-escape at byte {i}"),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_encoding::percent_decode(bytes)
        .decode_utf8()
        .context("The percent-decoded bytes are not valid UTF-8")
        .map_err(|e| DecodingError {
            raw_value: raw.to_string(),
            source: e,
        })
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to percent-decode `{raw_value}`")]
/// An error that occurred while decoding a percent-encoded cookie key or value.
pub(crate) struct DecodingError {
    pub(crate) raw_value: String,
    #[source]
    pub(crate) source: anyhow::Error,
}

#[cfg(test)]
mod tests {
    use super::{decode, encode_key, encode_value};

    #[test]
    fn keys_are_uri_component_encoded() {
        let cases = [
            ("key", "key"),
            ("\\\",; ñâé", "%5C%22%2C%3B%20%C3%B1%C3%A2%C3%A9"),
            // RFC 6265 token characters stay readable, `%` never does.
            ("#$%&+^`|", "#$%25&+^`|"),
            ("()", "%28%29"),
            ("a=b", "a%3Db"),
            ("-_.!~*'", "-_.!~*'"),
        ];
        for (key, expected) in cases {
            assert_eq!(encode_key(key).to_string(), expected, "key: {key}");
        }
    }

    #[test]
    fn values_only_escape_what_rfc6265_forbids() {
        let cases = [
            ("value", "value"),
            ("0", "0"),
            ("\\\",; ñâé%", "%5C%22%2C%3B%20%C3%B1%C3%A2%C3%A9%25"),
            ("#$&+/:<=>?@[]^`{|}~%", "#$&+/:<=>?@[]^`{|}~%25"),
            ("a\tb\u{7f}", "a%09b%7F"),
            ("()'*!", "()'*!"),
        ];
        for (value, expected) in cases {
            assert_eq!(encode_value(value).to_string(), expected, "value: {value}");
        }
    }

    #[test]
    fn decode_accepts_well_formed_escapes() {
        assert_eq!(decode("a%20b").unwrap(), "a b");
        assert_eq!(decode("%C3%B1").unwrap(), "ñ");
        assert_eq!(decode("#$&+").unwrap(), "#$&+");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn decode_rejects_malformed_input() {
        for raw in ["%", "%2", "%zz", "abc%4", "%D0%EE", "%F1%F2%F3%C0%C1%C2"] {
            let err = decode(raw).unwrap_err();
            assert_eq!(err.raw_value, raw);
        }
    }

    #[test]
    fn encoding_round_trips() {
        let samples = [
            "plain",
            "with space",
            "semi;colon,comma",
            "percent%25literal",
            "unicode ☃ 𝄞",
            "quote\"back\\slash",
            "#$&+/:<=>?@[]^`{|}~",
        ];
        for sample in samples {
            let key = encode_key(sample).to_string();
            let value = encode_value(sample).to_string();
            assert_eq!(decode(&key).unwrap(), sample);
            assert_eq!(decode(&value).unwrap(), sample);
        }
    }
}
