//! Query string parsing.
//!
//! Parses the raw query string lazily and keeps the distinction between a
//! bare flag (`?force`) and an empty value (`?name=`): the former has no
//! value at all, which is what the parameter binder's boolean-flag rule
//! keys on.

use std::borrow::Cow;

/// A parsed query string with lazy access to parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString<'a> {
    raw: &'a str,
}

impl<'a> QueryString<'a> {
    /// Parse a query string (without the leading `?`).
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        Self { raw }
    }

    /// Returns true if the query string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Iterate over `(key, value)` pairs in declaration order.
    ///
    /// A bare flag yields `("flag", None)`; an explicit empty value yields
    /// `("name", Some(""))`. Keys and values are not decoded here.
    pub fn pairs(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        self.raw.split('&').filter(|s| !s.is_empty()).map(|pair| {
            match pair.find('=') {
                Some(eq) => (&pair[..eq], Some(&pair[eq + 1..])),
                None => (pair, None),
            }
        })
    }

    /// First value for `key`, percent-decoded.
    ///
    /// Returns `None` both when the key is absent and when it is present
    /// as a bare flag; use [`QueryString::has`] to tell those apart.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Cow<'a, str>> {
        self.pairs()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v)
            .map(percent_decode)
    }

    /// Whether `key` appears at all, with or without a value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.pairs().any(|(k, _)| k == key)
    }

    /// All values for `key`, percent-decoded, skipping bare flags.
    pub fn values(&self, key: &str) -> impl Iterator<Item = Cow<'a, str>> {
        let key = key.to_owned();
        self.pairs()
            .filter(move |(k, _)| *k == key)
            .filter_map(|(_, v)| v)
            .map(percent_decode)
    }

    /// Number of parameters (flags included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs().count()
    }
}

/// Percent-decode a string, treating `+` as a space.
///
/// Returns `Cow::Borrowed` when no decoding was needed. Invalid percent
/// sequences pass through unchanged rather than failing the request.
#[must_use]
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.contains('%') && !s.contains('+') {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                    out.push(hi << 4 | lo);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_string() {
        let qs = QueryString::parse("");
        assert!(qs.is_empty());
        assert_eq!(qs.len(), 0);
        assert_eq!(qs.value("any"), None);
        assert!(!qs.has("any"));
    }

    #[test]
    fn values_and_flags_are_distinct() {
        let qs = QueryString::parse("name=&force&age=30");
        // Explicit empty value.
        assert_eq!(qs.value("name").as_deref(), Some(""));
        // Bare flag: present but valueless.
        assert_eq!(qs.value("force"), None);
        assert!(qs.has("force"));
        assert_eq!(qs.value("age").as_deref(), Some("30"));
    }

    #[test]
    fn first_of_repeated_keys_wins() {
        let qs = QueryString::parse("tag=a&tag=b");
        assert_eq!(qs.value("tag").as_deref(), Some("a"));
        let all: Vec<_> = qs.values("tag").collect();
        assert_eq!(all, vec!["a", "b"]);
    }

    #[test]
    fn decodes_percent_sequences_and_plus() {
        let qs = QueryString::parse("msg=hello%20world&alt=a+b");
        assert_eq!(qs.value("msg").as_deref(), Some("hello world"));
        assert_eq!(qs.value("alt").as_deref(), Some("a b"));
    }

    #[test]
    fn decodes_utf8() {
        let qs = QueryString::parse("word=caf%C3%A9");
        assert_eq!(qs.value("word").as_deref(), Some("café"));
    }

    #[test]
    fn stray_ampersands_are_ignored() {
        let qs = QueryString::parse("&a=1&&b=2&");
        assert_eq!(qs.len(), 2);
        assert_eq!(qs.value("a").as_deref(), Some("1"));
        assert_eq!(qs.value("b").as_deref(), Some("2"));
    }

    #[test]
    fn percent_decode_borrows_when_plain() {
        assert!(matches!(percent_decode("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn percent_decode_keeps_invalid_sequences() {
        assert_eq!(&*percent_decode("%ZZ"), "%ZZ");
        assert_eq!(&*percent_decode("%2"), "%2");
    }
}
