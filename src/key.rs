//! Key derivation for grouping and matching interactions
//!
//! A key is the stable identity `method + "." + path`, optionally extended
//! with `"?" + query` when the session records query strings as significant.
//! Live requests and stored interactions must derive identical keys for the
//! same logical endpoint, so both routes go through the same normalization.

use std::fmt;

use crate::intercept::LiveRequest;
use crate::storage::Interaction;
use crate::url;

/// Identity used to group and match interactions
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Key(String);

impl Key {
    /// Build a key from its raw parts.
    ///
    /// The query is appended only when `include_query` is set and the query
    /// string is non-empty. Method case is preserved.
    #[must_use]
    pub fn new(method: &str, path: &str, query: &str, include_query: bool) -> Self {
        let path = normalize_path(path);
        if include_query && !query.is_empty() {
            Self(format!("{method}.{path}?{query}"))
        } else {
            Self(format!("{method}.{path}"))
        }
    }

    /// Derive the key for a live request, parsing its raw URL.
    #[must_use]
    pub fn for_request(request: &LiveRequest, include_query: bool) -> Self {
        let parsed = url::parse(&request.url);
        Self::new(&request.method, &parsed.path, &parsed.query, include_query)
    }

    /// Derive the key for a stored interaction.
    #[must_use]
    pub fn for_interaction(interaction: &Interaction, include_query: bool) -> Self {
        Self::new(
            &interaction.method,
            &interaction.path,
            &interaction.query,
            include_query,
        )
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a URL path: trim surrounding whitespace and strip leading and
/// trailing slashes, so `/users/1/`, `users/1` and ` /users/1 ` all agree.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, url: &str) -> LiveRequest {
        LiveRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: None,
        }
    }

    #[test]
    fn test_key_format() {
        let key = Key::new("GET", "users/1", "", false);
        assert_eq!(key.as_str(), "GET.users/1");
    }

    #[test]
    fn test_key_slash_and_whitespace_normalization() {
        let plain = Key::new("GET", "users/1", "", false);

        assert_eq!(Key::new("GET", "/users/1", "", false), plain);
        assert_eq!(Key::new("GET", "users/1/", "", false), plain);
        assert_eq!(Key::new("GET", " /users/1/ ", "", false), plain);
    }

    #[test]
    fn test_key_preserves_method_case() {
        assert_ne!(
            Key::new("get", "users", "", false),
            Key::new("GET", "users", "", false)
        );
    }

    #[test]
    fn test_query_only_included_when_enabled_and_present() {
        assert_eq!(Key::new("GET", "a", "x=1", false).as_str(), "GET.a");
        assert_eq!(Key::new("GET", "a", "x=1", true).as_str(), "GET.a?x=1");
        // Enabled but absent: no trailing '?'
        assert_eq!(Key::new("GET", "a", "", true).as_str(), "GET.a");
    }

    #[test]
    fn test_request_key_routes_through_url_parser() {
        let req = request("GET", "https://api.example.com/users/1?x=1");

        assert_eq!(Key::for_request(&req, false).as_str(), "GET.users/1");
        assert_eq!(Key::for_request(&req, true).as_str(), "GET.users/1?x=1");
    }

    #[test]
    fn test_request_and_interaction_keys_agree() {
        let req = request("POST", "http://host/api/items/?page=1");
        let interaction = Interaction {
            method: "POST".to_string(),
            path: "api/items".to_string(),
            query: "page=1".to_string(),
            ..Interaction::default()
        };

        for include_query in [false, true] {
            assert_eq!(
                Key::for_request(&req, include_query),
                Key::for_interaction(&interaction, include_query)
            );
        }
    }
}
