use std::sync::Arc;

use crate::application::error::ServiceError;
use crate::application::input::required_text;
use crate::application::repos::{
    CreateLocaleParams, LocalesRepo, LocalesWriteRepo, UpdateLocaleParams,
};
use crate::cache::CacheTrigger;
use crate::domain::entities::LocaleRecord;
use crate::domain::error::ValidationErrors;

pub const MAX_CODE_LEN: usize = 10;
pub const MAX_NAME_LEN: usize = 50;

const ENTITY: &str = "locale";

/// Create or full update of a locale; both fields are required either way.
#[derive(Debug, Clone, Default)]
pub struct LocaleCommand {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct LocaleService {
    reader: Arc<dyn LocalesRepo>,
    writer: Arc<dyn LocalesWriteRepo>,
    cache_trigger: Option<Arc<CacheTrigger>>,
}

impl LocaleService {
    pub fn new(reader: Arc<dyn LocalesRepo>, writer: Arc<dyn LocalesWriteRepo>) -> Self {
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

    pub async fn list(&self) -> Result<Vec<LocaleRecord>, ServiceError> {
        Ok(self.reader.list_locales().await?)
    }

    pub async fn get(&self, id: i64) -> Result<LocaleRecord, ServiceError> {
        self.reader
            .find_locale(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn create(&self, command: LocaleCommand) -> Result<LocaleRecord, ServiceError> {
        let (code, name) = self.validate(&command, None).await?;

        let locale = self
            .writer
            .create_locale(CreateLocaleParams { code, name })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, None, err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.locale_upserted(locale.id);
        }

        Ok(locale)
    }

    pub async fn update(
        &self,
        id: i64,
        command: LocaleCommand,
    ) -> Result<LocaleRecord, ServiceError> {
        self.get(id).await?;
        let (code, name) = self.validate(&command, Some(id)).await?;

        let locale = self
            .writer
            .update_locale(UpdateLocaleParams { id, code, name })
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.locale_upserted(locale.id);
        }

        Ok(locale)
    }

    /// Removes the locale with its translations and their tag links.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.writer
            .delete_locale(id)
            .await
            .map_err(|err| ServiceError::from_write(ENTITY, Some(id), err))?;

        if let Some(trigger) = &self.cache_trigger {
            trigger.locale_deleted(id);
        }

        Ok(())
    }

    async fn validate(
        &self,
        command: &LocaleCommand,
        current: Option<i64>,
    ) -> Result<(String, String), ServiceError> {
        let mut errors = ValidationErrors::new();
        let code = required_text(
            &mut errors,
            "code",
            command.code.as_deref(),
            Some(MAX_CODE_LEN),
        );
        let name = required_text(
            &mut errors,
            "name",
            command.name.as_deref(),
            Some(MAX_NAME_LEN),
        );

        if let Some(code) = &code {
            if let Some(existing) = self.reader.find_locale_by_code(code).await? {
                if Some(existing.id) != current {
                    errors.add("code", "The code has already been taken.");
                }
            }
        }
        if let Some(name) = &name {
            if let Some(existing) = self.reader.find_locale_by_name(name).await? {
                if Some(existing.id) != current {
                    errors.add("name", "The name has already been taken.");
                }
            }
        }

        errors.into_result()?;
        match (code, name) {
            (Some(code), Some(name)) => Ok((code, name)),
            _ => Err(ServiceError::Validation(ValidationErrors::single(
                "code",
                "The code field is required.",
            ))),
        }
    }
}
