//! Repository traits describing persistence adapters.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{
    LocaleRecord, TagRecord, TranslationRecord, TranslationWithRelations,
};
use crate::domain::filter::TranslationFilter;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateLocaleParams {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UpdateLocaleParams {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateTagParams {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTagParams {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateTranslationParams {
    pub key: String,
    pub content: String,
    pub locale_id: i64,
    pub tag_ids: Option<Vec<i64>>,
}

/// Fully resolved update; unchanged fields carry the stored value.
#[derive(Debug, Clone)]
pub struct UpdateTranslationParams {
    pub id: i64,
    pub key: String,
    pub content: String,
    pub locale_id: i64,
    /// `Some` replaces the tag set, `None` leaves it untouched.
    pub tag_ids: Option<Vec<i64>>,
}

#[async_trait]
pub trait LocalesRepo: Send + Sync {
    async fn list_locales(&self) -> Result<Vec<LocaleRecord>, RepoError>;

    async fn find_locale(&self, id: i64) -> Result<Option<LocaleRecord>, RepoError>;

    async fn find_locale_by_code(&self, code: &str) -> Result<Option<LocaleRecord>, RepoError>;

    async fn find_locale_by_name(&self, name: &str) -> Result<Option<LocaleRecord>, RepoError>;
}

#[async_trait]
pub trait LocalesWriteRepo: Send + Sync {
    async fn create_locale(&self, params: CreateLocaleParams) -> Result<LocaleRecord, RepoError>;

    async fn update_locale(&self, params: UpdateLocaleParams) -> Result<LocaleRecord, RepoError>;

    /// Removes the locale, its translations and their tag associations.
    async fn delete_locale(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;

    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError>;

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepoError>;

    /// Subset of `ids` that refer to stored tags.
    async fn existing_tag_ids(&self, ids: &[i64]) -> Result<BTreeSet<i64>, RepoError>;
}

#[async_trait]
pub trait TagsWriteRepo: Send + Sync {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError>;

    async fn update_tag(&self, params: UpdateTagParams) -> Result<TagRecord, RepoError>;

    async fn delete_tag(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TranslationsRepo: Send + Sync {
    /// Every translation satisfying `filter`, ordered by id.
    async fn find_matching(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationWithRelations>, RepoError>;

    async fn find_translation(
        &self,
        id: i64,
    ) -> Result<Option<TranslationWithRelations>, RepoError>;

    async fn find_translation_by_key(
        &self,
        locale_id: i64,
        key: &str,
    ) -> Result<Option<TranslationRecord>, RepoError>;
}

#[async_trait]
pub trait TranslationsWriteRepo: Send + Sync {
    /// Inserts the row and syncs tags in one transaction.
    async fn create_translation(
        &self,
        params: CreateTranslationParams,
    ) -> Result<TranslationWithRelations, RepoError>;

    /// Updates the row and syncs tags in one transaction.
    async fn update_translation(
        &self,
        params: UpdateTranslationParams,
    ) -> Result<TranslationWithRelations, RepoError>;

    /// Detaches all tags, then removes the row, in one transaction.
    async fn delete_translation(&self, id: i64) -> Result<(), RepoError>;

    /// Sync semantics: tags not in `tag_ids` are detached, missing ones attached.
    async fn replace_translation_tags(&self, id: i64, tag_ids: &[i64]) -> Result<(), RepoError>;
}

/// One synthetic translation produced by the seeder.
#[derive(Debug, Clone)]
pub struct NewSeedTranslation {
    pub key: String,
    pub content: String,
    pub locale_id: i64,
    pub tag_ids: Vec<i64>,
}

#[async_trait]
pub trait SeedRepo: Send + Sync {
    /// Inserts missing `(code, name)` locales and returns all of them.
    async fn ensure_locales(&self, locales: &[(&str, &str)]) -> Result<Vec<LocaleRecord>, RepoError>;

    /// Inserts missing tags by name and returns all of them.
    async fn ensure_tags(&self, names: &[&str]) -> Result<Vec<TagRecord>, RepoError>;

    /// Inserts one chunk and its tag links in a single transaction.
    ///
    /// Rows whose `(locale_id, key)` already exists are skipped. Returns the
    /// number of translations inserted.
    async fn insert_seed_chunk(&self, rows: &[NewSeedTranslation]) -> Result<u64, RepoError>;
}
