//! Cache key derivation.
//!
//! A query key is the SHA-256 of a canonical JSON rendering of every filter
//! dimension plus the response format. Dimensions are ordered sets, so
//! `tag=1,3` and `tag=3,1` render identically. Absent dimensions render as
//! `null` and empty ones as `[]`, keeping "no constraint" and "match nothing"
//! apart.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::application::shape::ResponseFormat;
use crate::domain::filter::TranslationFilter;

/// Prefix shared by every key of the catalog query namespace.
pub const QUERY_NAMESPACE: &str = "translations";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryCacheKey(String);

#[derive(Serialize)]
struct CanonicalQuery<'a> {
    locale: Option<&'a BTreeSet<String>>,
    tag: Option<&'a BTreeSet<i64>>,
    key: Option<&'a BTreeSet<String>>,
    content: Option<&'a BTreeSet<String>>,
    format: &'static str,
}

impl QueryCacheKey {
    pub fn for_query(filter: &TranslationFilter, format: ResponseFormat) -> Self {
        let canonical = CanonicalQuery {
            locale: filter.locales.as_ref(),
            tag: filter.tag_ids.as_ref(),
            key: filter.keys.as_ref(),
            content: filter.contents.as_ref(),
            format: format.as_str(),
        };

        // Serializing sets of strings and integers cannot fail.
        let encoded = serde_json::to_vec(&canonical).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        Self(format!(
            "{QUERY_NAMESPACE}:{}",
            hex::encode(hasher.finalize())
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(ids: &[i64]) -> TranslationFilter {
        TranslationFilter {
            tag_ids: Some(ids.iter().copied().collect()),
            ..Default::default()
        }
    }

    #[test]
    fn tag_order_does_not_change_key() {
        let a = QueryCacheKey::for_query(&tags(&[1, 3]), ResponseFormat::Flat);
        let b = QueryCacheKey::for_query(&tags(&[3, 1]), ResponseFormat::Flat);
        assert_eq!(a, b);
    }

    #[test]
    fn key_is_namespaced_and_fixed_length() {
        let key = QueryCacheKey::for_query(&TranslationFilter::default(), ResponseFormat::Flat);
        let digest = key
            .as_str()
            .strip_prefix("translations:")
            .expect("namespace prefix");
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn format_is_part_of_the_key() {
        let filter = TranslationFilter::default();
        assert_ne!(
            QueryCacheKey::for_query(&filter, ResponseFormat::Flat),
            QueryCacheKey::for_query(&filter, ResponseFormat::Nested)
        );
    }

    #[test]
    fn absent_and_empty_dimensions_differ() {
        let empty = TranslationFilter {
            locales: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert_ne!(
            QueryCacheKey::for_query(&TranslationFilter::default(), ResponseFormat::Flat),
            QueryCacheKey::for_query(&empty, ResponseFormat::Flat)
        );
    }

    #[test]
    fn dimensions_do_not_alias_each_other() {
        let by_key = TranslationFilter {
            keys: Some(BTreeSet::from(["checkout".to_string()])),
            ..Default::default()
        };
        let by_content = TranslationFilter {
            contents: Some(BTreeSet::from(["checkout".to_string()])),
            ..Default::default()
        };
        assert_ne!(
            QueryCacheKey::for_query(&by_key, ResponseFormat::Flat),
            QueryCacheKey::for_query(&by_content, ResponseFormat::Flat)
        );
    }
}
