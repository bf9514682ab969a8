//! Response shaping for catalog queries.
//!
//! Flat mode returns the hydrated translations unchanged. Nested mode builds
//! `locale -> tag -> key tree`, splitting each key on `.` and merging shared
//! prefixes into one branch.

use std::collections::BTreeMap;

use lexicon_api_types::TranslationView;
use serde::Serialize;

use crate::domain::entities::TranslationWithRelations;
use crate::domain::error::ValidationErrors;
use crate::domain::filter::RawFilterValue;

/// Bucket used in nested mode for translations without any tag.
pub const UNTAGGED_BUCKET: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    #[default]
    Flat,
    Nested,
}

impl ResponseFormat {
    /// Parse the `format` flag. Absent or blank means flat.
    pub fn from_raw(raw: Option<&RawFilterValue>) -> Result<Self, ValidationErrors> {
        let Some(value) = raw.and_then(RawFilterValue::last) else {
            return Ok(Self::Flat);
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "flat" => Ok(Self::Flat),
            "1" | "true" | "nested" => Ok(Self::Nested),
            other => Err(ValidationErrors::single(
                "format",
                format!("`{other}` is not a supported format; use 0 (flat) or 1 (nested)."),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Nested => "nested",
        }
    }
}

/// One level of a nested key tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NestedNode {
    Leaf(String),
    Branch(BTreeMap<String, NestedNode>),
}

pub type NestedTree = BTreeMap<String, NestedNode>;

/// `locale code -> tag name -> key tree`.
pub type NestedCatalog = BTreeMap<String, BTreeMap<String, NestedTree>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ShapedTranslations {
    Flat(Vec<TranslationView>),
    Nested(NestedCatalog),
}

impl ShapedTranslations {
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(items) => items.len(),
            Self::Nested(catalog) => catalog.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn shape(translations: &[TranslationWithRelations], format: ResponseFormat) -> ShapedTranslations {
    match format {
        ResponseFormat::Flat => ShapedTranslations::Flat(shape_flat(translations)),
        ResponseFormat::Nested => ShapedTranslations::Nested(shape_nested(translations)),
    }
}

pub fn shape_flat(translations: &[TranslationWithRelations]) -> Vec<TranslationView> {
    translations.iter().map(TranslationView::from).collect()
}

/// Build the nested catalog.
///
/// Tags on each translation are whatever the query loaded, so an active tag
/// filter has already removed non-matching tags. A path that conflicts with
/// an existing leaf or branch replaces it; the last translation wins.
pub fn shape_nested(translations: &[TranslationWithRelations]) -> NestedCatalog {
    let mut catalog = NestedCatalog::new();

    for item in translations {
        let by_tag = catalog.entry(item.locale.code.clone()).or_default();
        let segments: Vec<&str> = item.translation.key.split('.').collect();
        let content = item.translation.content.as_str();

        if item.tags.is_empty() {
            let tree = by_tag.entry(UNTAGGED_BUCKET.to_string()).or_default();
            insert_path(tree, &segments, content);
            continue;
        }

        for tag in &item.tags {
            let tree = by_tag.entry(tag.name.clone()).or_default();
            insert_path(tree, &segments, content);
        }
    }

    catalog
}

fn insert_path(level: &mut NestedTree, path: &[&str], content: &str) {
    match path {
        [] => {}
        [last] => {
            level.insert((*last).to_string(), NestedNode::Leaf(content.to_string()));
        }
        [head, rest @ ..] => {
            let node = level
                .entry((*head).to_string())
                .or_insert_with(|| NestedNode::Branch(NestedTree::new()));
            if let NestedNode::Leaf(_) = node {
                *node = NestedNode::Branch(NestedTree::new());
            }
            if let NestedNode::Branch(children) = node {
                insert_path(children, rest, content);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::entities::{LocaleRecord, TagRecord, TranslationRecord};

    fn locale(id: i64, code: &str) -> LocaleRecord {
        let now = OffsetDateTime::UNIX_EPOCH;
        LocaleRecord {
            id,
            code: code.to_string(),
            name: code.to_uppercase(),
            created_at: now,
            updated_at: now,
        }
    }

    fn tag(id: i64, name: &str) -> TagRecord {
        let now = OffsetDateTime::UNIX_EPOCH;
        TagRecord {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn translation(
        id: i64,
        key: &str,
        content: &str,
        locale: LocaleRecord,
        tags: Vec<TagRecord>,
    ) -> TranslationWithRelations {
        let now = OffsetDateTime::UNIX_EPOCH;
        TranslationWithRelations {
            translation: TranslationRecord {
                id,
                key: key.to_string(),
                content: content.to_string(),
                locale_id: locale.id,
                created_at: now,
                updated_at: now,
            },
            locale,
            tags,
        }
    }

    #[test]
    fn format_flag_parsing() {
        let scalar = |v: &str| RawFilterValue::Scalar(v.to_string());

        assert_eq!(ResponseFormat::from_raw(None).unwrap(), ResponseFormat::Flat);
        assert_eq!(
            ResponseFormat::from_raw(Some(&scalar("0"))).unwrap(),
            ResponseFormat::Flat
        );
        assert_eq!(
            ResponseFormat::from_raw(Some(&scalar("1"))).unwrap(),
            ResponseFormat::Nested
        );
        assert_eq!(
            ResponseFormat::from_raw(Some(&scalar(" Nested "))).unwrap(),
            ResponseFormat::Nested
        );

        let err = ResponseFormat::from_raw(Some(&scalar("tree"))).unwrap_err();
        assert!(err.contains("format"));
    }

    #[test]
    fn nested_single_translation() {
        let rows = vec![translation(
            1,
            "checkout.title",
            "Paiement",
            locale(2, "fr"),
            vec![tag(1, "mobile")],
        )];

        let shaped = serde_json::to_value(shape(&rows, ResponseFormat::Nested)).unwrap();

        assert_eq!(
            shaped,
            json!({"fr": {"mobile": {"checkout": {"title": "Paiement"}}}})
        );
    }

    #[test]
    fn shared_prefixes_merge() {
        let fr = locale(2, "fr");
        let mobile = tag(1, "mobile");
        let rows = vec![
            translation(1, "checkout.title", "Paiement", fr.clone(), vec![mobile.clone()]),
            translation(2, "checkout.subtitle", "Finaliser", fr, vec![mobile]),
        ];

        let shaped = serde_json::to_value(shape_nested(&rows)).unwrap();

        assert_eq!(
            shaped,
            json!({"fr": {"mobile": {"checkout": {
                "title": "Paiement",
                "subtitle": "Finaliser"
            }}}})
        );
    }

    #[test]
    fn translation_appears_under_each_tag() {
        let rows = vec![translation(
            1,
            "home.cta",
            "Start",
            locale(1, "en"),
            vec![tag(1, "mobile"), tag(3, "web")],
        )];

        let shaped = serde_json::to_value(shape_nested(&rows)).unwrap();

        assert_eq!(
            shaped,
            json!({"en": {
                "mobile": {"home": {"cta": "Start"}},
                "web": {"home": {"cta": "Start"}}
            }})
        );
    }

    #[test]
    fn untagged_translations_use_all_bucket() {
        let rows = vec![translation(1, "footer", "Bye", locale(1, "en"), Vec::new())];

        let shaped = serde_json::to_value(shape_nested(&rows)).unwrap();

        assert_eq!(shaped, json!({"en": {"all": {"footer": "Bye"}}}));
    }

    #[test]
    fn leaf_becomes_branch_when_descended_into() {
        let en = locale(1, "en");
        let rows = vec![
            translation(1, "menu", "Menu", en.clone(), Vec::new()),
            translation(2, "menu.open", "Open", en, Vec::new()),
        ];

        let shaped = serde_json::to_value(shape_nested(&rows)).unwrap();

        assert_eq!(shaped, json!({"en": {"all": {"menu": {"open": "Open"}}}}));
    }

    #[test]
    fn flat_mode_keeps_relations() {
        let rows = vec![translation(
            5,
            "checkout.title",
            "Checkout",
            locale(1, "en"),
            vec![tag(2, "desktop")],
        )];

        let shaped = serde_json::to_value(shape(&rows, ResponseFormat::Flat)).unwrap();

        assert_eq!(
            shaped,
            json!([{
                "id": 5,
                "key": "checkout.title",
                "content": "Checkout",
                "locale": {"id": 1, "code": "en", "name": "EN"},
                "tags": [{"id": 2, "name": "desktop"}]
            }])
        );
    }

    #[test]
    fn empty_result_shapes() {
        assert_eq!(
            serde_json::to_value(shape(&[], ResponseFormat::Flat)).unwrap(),
            json!([])
        );
        assert_eq!(
            serde_json::to_value(shape(&[], ResponseFormat::Nested)).unwrap(),
            json!({})
        );
    }
}
