//! Filter normalization for catalog queries.
//!
//! Raw query parameters arrive either as a single, possibly comma-joined
//! scalar or as a repeated/array parameter. Each dimension is normalized into
//! an ordered set so that logically identical requests compare equal.
//!
//! `None` means "no constraint". `Some(empty)` means "match nothing"; it never
//! comes out of [`normalize`] but stays representable for programmatic
//! callers.

use std::collections::BTreeSet;

use super::error::ValidationErrors;

/// A filter parameter exactly as it was supplied on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawFilterValue {
    /// Last supplied value, used for single-valued flags such as `format`.
    pub fn last(&self) -> Option<&str> {
        match self {
            RawFilterValue::Scalar(value) => Some(value.as_str()),
            RawFilterValue::List(values) => values.last().map(String::as_str),
        }
    }
}

/// Raw, unvalidated catalog query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTranslationQuery {
    pub locale: Option<RawFilterValue>,
    pub tag: Option<RawFilterValue>,
    pub key: Option<RawFilterValue>,
    pub content: Option<RawFilterValue>,
    pub format: Option<RawFilterValue>,
}

/// Normalize one raw filter value into a set of trimmed, non-empty strings.
pub fn normalize(raw: Option<&RawFilterValue>) -> Option<BTreeSet<String>> {
    let values: BTreeSet<String> = match raw? {
        RawFilterValue::Scalar(value) => value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        RawFilterValue::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    };

    (!values.is_empty()).then_some(values)
}

/// Canonical filter over the four catalog dimensions.
///
/// Key and content substrings are stored lowercased since matching is
/// case-insensitive; locale codes are matched exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationFilter {
    pub locales: Option<BTreeSet<String>>,
    pub tag_ids: Option<BTreeSet<i64>>,
    pub keys: Option<BTreeSet<String>>,
    pub contents: Option<BTreeSet<String>>,
}

impl TranslationFilter {
    pub fn from_raw(raw: &RawTranslationQuery) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let tag_ids = match normalize(raw.tag.as_ref()) {
            Some(values) => {
                let mut ids = BTreeSet::new();
                for value in values {
                    match value.parse::<i64>() {
                        Ok(id) => {
                            ids.insert(id);
                        }
                        Err(_) => errors.add("tag", format!("`{value}` is not a valid tag id.")),
                    }
                }
                Some(ids)
            }
            None => None,
        };

        errors.into_result()?;

        Ok(Self {
            locales: normalize(raw.locale.as_ref()),
            tag_ids,
            keys: normalize(raw.key.as_ref()).map(lowercase_all),
            contents: normalize(raw.content.as_ref()).map(lowercase_all),
        })
    }

    pub fn is_unconstrained(&self) -> bool {
        self.locales.is_none()
            && self.tag_ids.is_none()
            && self.keys.is_none()
            && self.contents.is_none()
    }
}

fn lowercase_all(values: BTreeSet<String>) -> BTreeSet<String> {
    values.into_iter().map(|value| value.to_lowercase()).collect()
}
