use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::repos::RepoError, domain::error::ValidationErrors, infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Failure of a catalog service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Classify a repository failure raised by a write on `entity` `id`.
    ///
    /// A unique violation that slipped past pre-validation (two concurrent
    /// writers) is reported against the field its constraint guards.
    pub fn from_write(entity: &'static str, id: Option<i64>, error: RepoError) -> Self {
        match error {
            RepoError::NotFound => match id {
                Some(id) => Self::not_found(entity, id),
                None => Self::Repo(RepoError::NotFound),
            },
            RepoError::Duplicate { constraint } => match duplicate_field(&constraint) {
                Some(field) => Self::Validation(ValidationErrors::single(
                    field,
                    format!("The {field} has already been taken."),
                )),
                None => Self::Repo(RepoError::Duplicate { constraint }),
            },
            other => Self::Repo(other),
        }
    }
}

fn duplicate_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "locales_code_key" => Some("code"),
        "locales_name_key" | "tags_name_key" => Some("name"),
        "translations_locale_id_key_key" => Some("key"),
        _ => None,
    }
}

/// Process-level failure surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
