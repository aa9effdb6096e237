//! Cache key normalization

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized resource identifier used as the cache key
///
/// Two spellings of the same resource map to the same key: surrounding
/// whitespace is trimmed, scheme and host are lowercased, the fragment is
/// dropped and a trailing slash on the path is removed. Query strings are kept
/// verbatim since they usually select different content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn normalize(identifier: &str) -> Self {
        let trimmed = identifier.trim();

        let without_fragment = match trimmed.find('#') {
            Some(idx) => &trimmed[..idx],
            None => trimmed,
        };

        let (scheme, rest) = match without_fragment.find("://") {
            Some(idx) => (
                Some(without_fragment[..idx].to_ascii_lowercase()),
                &without_fragment[idx + 3..],
            ),
            None => (None, without_fragment),
        };

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let authority = rest[..authority_end].to_ascii_lowercase();
        let remainder = &rest[authority_end..];

        let (path, query) = match remainder.find('?') {
            Some(idx) => (&remainder[..idx], &remainder[idx..]),
            None => (remainder, ""),
        };
        let path = path.trim_end_matches('/');

        let mut key = String::with_capacity(without_fragment.len());
        if let Some(scheme) = scheme {
            key.push_str(&scheme);
            key.push_str("://");
        }
        key.push_str(&authority);
        key.push_str(path);
        key.push_str(query);

        CacheKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(identifier: &str) -> Self {
        CacheKey::normalize(identifier)
    }
}

impl From<String> for CacheKey {
    fn from(identifier: String) -> Self {
        CacheKey::normalize(&identifier)
    }
}
