//! Loose URL parsing
//!
//! Splits a URL string into its structural fields per the standard URI
//! grammar (scheme, authority, path, query, fragment) while tolerating
//! malformed or partial inputs such as relative paths. Pure functions, no
//! allocation beyond the output, never fails.

use urlencoding::decode;

/// Structured fields of a parsed URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// URI scheme, e.g. `https` (empty for relative URLs)
    pub scheme: String,
    /// Authority component: `user@host:port` (empty for relative URLs)
    pub authority: String,
    /// Path component, exactly as written
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Fragment without the leading `#`
    pub fragment: String,
}

impl ParsedUrl {
    /// Decode the query string into key/value pairs.
    ///
    /// Keys without `=` get an empty value. Percent-decoding failures keep
    /// the raw token, matching the parser's tolerance everywhere else.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        if self.query.is_empty() {
            return Vec::new();
        }

        self.query
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = match part.split_once('=') {
                    Some((k, v)) => (k, v),
                    None => (part, ""),
                };
                (decode_lossy(key), decode_lossy(value))
            })
            .collect()
    }
}

/// Parse a URL string into its structural fields.
///
/// Accepts absolute URLs (`https://host:8080/a/b?x=1#top`), protocol-relative
/// URLs (`//host/a`), and bare relative paths (`a/b?x=1`). Anything that does
/// not fit the grammar lands in `path` rather than failing.
#[must_use]
pub fn parse(input: &str) -> ParsedUrl {
    let mut url = ParsedUrl::default();
    let input = input.trim();

    // Fragment first so '?' inside a fragment is not mistaken for a query
    let (rest, fragment) = match input.split_once('#') {
        Some((r, f)) => (r, f),
        None => (input, ""),
    };
    url.fragment = fragment.to_string();

    let (rest, query) = match rest.split_once('?') {
        Some((r, q)) => (r, q),
        None => (rest, ""),
    };
    url.query = query.to_string();

    // An authority is only present when the input carries a scheme or a
    // protocol-relative prefix; a bare "a/b" is all path.
    let (rest, has_authority) = match rest.split_once("://") {
        Some((scheme, tail)) if is_scheme(scheme) => {
            url.scheme = scheme.to_string();
            (tail, true)
        }
        _ => match rest.strip_prefix("//") {
            Some(tail) => (tail, true),
            None => (rest, false),
        },
    };

    if has_authority {
        match rest.find('/') {
            Some(idx) => {
                url.authority = rest[..idx].to_string();
                url.path = rest[idx..].to_string();
            }
            None => {
                url.authority = rest.to_string();
            }
        }
    } else {
        url.path = rest.to_string();
    }

    url
}

/// A scheme is one or more ASCII alphanumeric, `+`, `-`, or `.` characters
/// starting with a letter.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn decode_lossy(token: &str) -> String {
    decode(token).map_or_else(|_| token.to_string(), |d| d.into_owned())
}
