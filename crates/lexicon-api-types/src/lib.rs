//! Wire types shared between the Lexicon server and its clients.
//!
//! Write payloads keep every field optional so that missing values surface as
//! field-level validation errors instead of opaque decode failures.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LocaleWriteRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TagWriteRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body accepted by both `POST /api/translations` and `PUT /api/translations/{id}`.
///
/// On create `key`, `content` and `locale_id` are required. On update every
/// field is optional; `tags`, when present, replaces the full tag set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TranslationWriteRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub locale_id: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
}

/// Body of `PUT /api/translations/{id}/tags`: the complete new tag set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TranslationTagsRequest {
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocaleView {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagView {
    pub id: i64,
    pub name: String,
}

/// Flat representation of one translation with its relations expanded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationView {
    pub id: i64,
    pub key: String,
    pub content: String,
    pub locale: LocaleView,
    pub tags: Vec<TagView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
