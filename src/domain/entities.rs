//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use lexicon_api_types::{LocaleView, TagView, TranslationView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleRecord {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRecord {
    pub id: i64,
    pub key: String,
    pub content: String,
    pub locale_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A translation loaded together with its owning locale and its attached tags.
///
/// When the row was fetched under a tag filter, `tags` only holds the tags
/// that matched the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationWithRelations {
    pub translation: TranslationRecord,
    pub locale: LocaleRecord,
    pub tags: Vec<TagRecord>,
}

impl From<&LocaleRecord> for LocaleView {
    fn from(locale: &LocaleRecord) -> Self {
        Self {
            id: locale.id,
            code: locale.code.clone(),
            name: locale.name.clone(),
        }
    }
}

impl From<&TagRecord> for TagView {
    fn from(tag: &TagRecord) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

impl From<&TranslationWithRelations> for TranslationView {
    fn from(entry: &TranslationWithRelations) -> Self {
        Self {
            id: entry.translation.id,
            key: entry.translation.key.clone(),
            content: entry.translation.content.clone(),
            locale: LocaleView::from(&entry.locale),
            tags: entry.tags.iter().map(TagView::from).collect(),
        }
    }
}
