use std::sync::Arc;

use crate::application::error::ServiceError;
use crate::application::input::required_text;
use crate::application::repos::{CreateTagParams, TagsRepo, TagsWriteRepo, UpdateTagParams};
use crate::cache::CacheTrigger;
use crate::domain::entities::TagRecord;
use crate::domain::error::ValidationErrors;

pub const MAX_TAG_NAME_LEN: usize = 50;

const ENTITY: &str = "tag";

#[derive(Debug, Clone, Default)]
pub struct TagCommand {
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct TagService {
    reader: Arc<dyn TagsRepo>,
    writer: Arc<dyn TagsWriteRepo>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl TagService {
    pub fn new(reader: Arc<dyn TagsRepo>, writer: Arc<dyn TagsWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            cache_trigger: None,
        }
    }

    pub fn with_cache_trigger_opt(mut self, trigger: Option<Arc<CacheTrigger>>) -> Self {
        self.cache_trigger = trigger;
        self
    }

    pub async fn list(&self) -> Result<Vec<TagRecord>, ServiceError> {
        Ok(self.reader.list_tags().await?)
    }

    pub async fn get(&self, id: i64) -> Result<TagRecord, ServiceError> {
        self.reader
            .find_tag(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn create(&self, command: TagCommand) -> Result<TagRecord, ServiceError> {
        let name = self.validate(&command, None).await?;

        let tag = self
            .writer
            .create_tag(CreateTagParams { name })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, None, err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.tag_upserted(tag.id);
        }

        Ok(tag)
    }

    pub async fn update(&self, id: i64, command: TagCommand) -> Result<TagRecord, ServiceError> {
        self.get(id).await?;
        let name = self.validate(&command, Some(id)).await?;

        let tag = self
            .writer
            .update_tag(UpdateTagParams { id, name })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.tag_upserted(tag.id);
        }

        Ok(tag)
    }

    /// Removes the tag and every association to it.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.writer
            .delete_tag(id)
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.tag_deleted(id);
        }

        Ok(())
    }

    async fn validate(
        &self,
        command: &TagCommand,
        current: Option<i64>,
    ) -> Result<String, ServiceError> {
        let mut errors = ValidationErrors::new();
        let name = required_text(
            &mut errors,
            "name",
            command.name.as_deref(),
            Some(MAX_TAG_NAME_LEN),
        );

        let Some(name) = name else {
            return Err(ServiceError::Validation(errors));
        };

        if let Some(existing) = self.reader.find_tag_by_name(&name).await? {
            if Some(existing.id) != current {
                errors.add("name", "The name has already been taken.");
            }
        }

        errors.into_result()?;
        Ok(name)
    }
}
