//! Translation writes.
//!
//! Every write validates fully before touching storage, then runs as a single
//! repository transaction (row plus tag sync) and flushes the query cache
//! once it commits.

use std::sync::Arc;

use crate::application::error::ServiceError;
use crate::application::input::{dedup_ids, optional_text, required_text};
use crate::application::repos::{
    CreateTranslationParams, LocalesRepo, TagsRepo, TranslationsRepo, TranslationsWriteRepo,
    UpdateTranslationParams,
};
use crate::cache::CacheTrigger;
use crate::domain::entities::TranslationWithRelations;
use crate::domain::error::ValidationErrors;

pub const MAX_KEY_LEN: usize = 255;

const ENTITY: &str = "translation";

/// Create payload, or partial update payload where absent fields are kept.
///
/// `tags`, when present, replaces the full tag set.
#[derive(Debug, Clone, Default)]
pub struct TranslationCommand {
    pub key: Option<String>,
    pub content: Option<String>,
    pub locale_id: Option<i64>,
    pub tags: Option<Vec<i64>>,
}

#[derive(Clone)]
pub struct TranslationService {
    reader: Arc<dyn TranslationsRepo>,
    writer: Arc<dyn TranslationsWriteRepo>,
    locales: Arc<dyn LocalesRepo>,
    tags: Arc<dyn TagsRepo>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl TranslationService {
    pub fn new(
        reader: Arc<dyn TranslationsRepo>,
        writer: Arc<dyn TranslationsWriteRepo>,
        locales: Arc<dyn LocalesRepo>,
        tags: Arc<dyn TagsRepo>,
    ) -> Self {
        Self {
            reader,
            writer,
            locales,
            tags,
            cache_trigger: None,
        }
    }

    pub fn with_cache_trigger_opt(mut self, trigger: Option<Arc<CacheTrigger>>) -> Self {
        self.cache_trigger = trigger;
        self
    }

    pub async fn get(&self, id: i64) -> Result<TranslationWithRelations, ServiceError> {
        self.reader
            .find_translation(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn create(
        &self,
        command: TranslationCommand,
    ) -> Result<TranslationWithRelations, ServiceError> {
        let mut errors = ValidationErrors::new();

        let key = required_text(&mut errors, "key", command.key.as_deref(), Some(MAX_KEY_LEN));
        let content = required_content(&mut errors, command.content);
        let locale_id = match command.locale_id {
            Some(id) => self.check_locale(&mut errors, id).await?,
            None => {
                errors.add("locale_id", "The locale id field is required.");
                None
            }
        };
        let tag_ids = self.check_tags(&mut errors, command.tags.as_deref()).await?;

        if let (Some(key), Some(locale_id)) = (&key, locale_id) {
            self.check_unique_key(&mut errors, locale_id, key, None).await?;
        }

        errors.into_result()?;
        let (Some(key), Some(content), Some(locale_id)) = (key, content, locale_id) else {
            return Err(ServiceError::Validation(ValidationErrors::single(
                "key",
                "The key field is required.",
            )));
        };

        let created = self
            .writer
            .create_translation(CreateTranslationParams {
                key,
                content,
                locale_id,
                tag_ids,
            })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, None, err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.translation_upserted(created.translation.id);
        }

        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        command: TranslationCommand,
    ) -> Result<TranslationWithRelations, ServiceError> {
        let existing = self.get(id).await?;
        let mut errors = ValidationErrors::new();

        let key = optional_text(&mut errors, "key", command.key.as_deref(), Some(MAX_KEY_LEN));
        let content = match command.content {
            Some(content) => required_content(&mut errors, Some(content)),
            None => None,
        };
        let locale_id = match command.locale_id {
            Some(id) => self.check_locale(&mut errors, id).await?,
            None => None,
        };
        let tag_ids = self.check_tags(&mut errors, command.tags.as_deref()).await?;

        let key_supplied = command.key.is_some();
        let locale_supplied = command.locale_id.is_some();
        let key_valid = !key_supplied || key.is_some();
        let locale_valid = !locale_supplied || locale_id.is_some();

        let key = key.unwrap_or_else(|| existing.translation.key.clone());
        let locale_id = locale_id.unwrap_or(existing.translation.locale_id);
        if key_valid && locale_valid {
            self.check_unique_key(&mut errors, locale_id, &key, Some(id))
                .await?;
        }

        errors.into_result()?;

        let updated = self
            .writer
            .update_translation(UpdateTranslationParams {
                id,
                key,
                content: content.unwrap_or(existing.translation.content),
                locale_id,
                tag_ids,
            })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.translation_upserted(id);
        }

        Ok(updated)
    }

    /// Detaches every tag and removes the translation.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.writer
            .delete_translation(id)
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.translation_deleted(id);
        }

        Ok(())
    }

    /// Sync the tag set of a translation to exactly `tags`.
    pub async fn replace_tags(
        &self,
        id: i64,
        tags: Option<Vec<i64>>,
    ) -> Result<TranslationWithRelations, ServiceError> {
        self.get(id).await?;

        let mut errors = ValidationErrors::new();
        let Some(tags) = tags else {
            errors.add("tags", "The tags field is required.");
            return Err(ServiceError::Validation(errors));
        };
        let tag_ids = self
            .check_tags(&mut errors, Some(&tags))
            .await?
            .unwrap_or_default();
        errors.into_result()?;

        self.writer
            .replace_translation_tags(id, &tag_ids)
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.translation_tags_replaced(id);
        }

        self.get(id).await
    }

    async fn check_locale(
        &self,
        errors: &mut ValidationErrors,
        locale_id: i64,
    ) -> Result<Option<i64>, ServiceError> {
        match self.locales.find_locale(locale_id).await? {
            Some(locale) => Ok(Some(locale.id)),
            None => {
                errors.add("locale_id", "The selected locale id is invalid.");
                Ok(None)
            }
        }
    }

    async fn check_tags(
        &self,
        errors: &mut ValidationErrors,
        tags: Option<&[i64]>,
    ) -> Result<Option<Vec<i64>>, ServiceError> {
        let Some(tags) = tags else {
            return Ok(None);
        };

        let ids = dedup_ids(tags);
        let existing = self.tags.existing_tag_ids(&ids).await?;
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !existing.contains(id))
            .map(i64::to_string)
            .collect();

        if !missing.is_empty() {
            errors.add(
                "tags",
                format!("The selected tags are invalid: {}.", missing.join(", ")),
            );
        }

        Ok(Some(ids))
    }

    async fn check_unique_key(
        &self,
        errors: &mut ValidationErrors,
        locale_id: i64,
        key: &str,
        current: Option<i64>,
    ) -> Result<(), ServiceError> {
        if let Some(found) = self.reader.find_translation_by_key(locale_id, key).await? {
            if Some(found.id) != current {
                errors.add("key", "The key has already been taken.");
            }
        }
        Ok(())
    }
}

fn required_content(errors: &mut ValidationErrors, content: Option<String>) -> Option<String> {
    match content {
        Some(content) if !content.trim().is_empty() => Some(content),
        _ => {
            errors.add("content", "The content field is required.");
            None
        }
    }
}
