//! API handlers organized by resource type.
//!
//! Helper functions for error conversion are defined here and shared across modules.

mod locales;
mod tags;
mod translations;

pub use locales::*;
pub use tags::*;
pub use translations::*;

use axum::http::StatusCode;

use crate::application::error::ServiceError;
use crate::application::repos::RepoError;

use super::error::{ApiError, codes};

pub(super) fn service_to_api(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(errors) => ApiError::validation(errors),
        ServiceError::NotFound { entity, id } => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            Some(format!("{entity} {id} not found")),
        ),
        ServiceError::Repo(repo) => repo_to_api(repo),
    }
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationErrors;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ServiceError::Validation(ValidationErrors::single("name", "bad")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::not_found("translation", 9),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Repo(RepoError::Duplicate {
                    constraint: "x".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (ServiceError::Repo(RepoError::Timeout), StatusCode::SERVICE_UNAVAILABLE),
            (
                ServiceError::Repo(RepoError::Persistence("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(service_to_api(err).status(), status);
        }
    }

    #[test]
    fn not_found_uses_not_found_code() {
        let api = service_to_api(ServiceError::not_found("locale", 3));
        assert_eq!(api.code(), codes::NOT_FOUND);
    }
}
