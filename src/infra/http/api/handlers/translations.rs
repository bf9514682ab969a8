//! Translation handlers, including the filtered catalog read.

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lexicon_api_types::{
    MessageResponse, TranslationTagsRequest, TranslationView, TranslationWriteRequest,
};

use crate::application::catalog::CatalogQuery;
use crate::application::translations::TranslationCommand;

use super::service_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::query::parse_translation_query;
use crate::infra::http::api::state::ApiState;

pub async fn list_translations(
    State(state): State<ApiState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let query = CatalogQuery::from_raw(&parse_translation_query(raw.as_deref()))
        .map_err(ApiError::validation)?;

    let shaped = state
        .catalog
        .query(&query)
        .await
        .map_err(service_to_api)?;

    Ok(Json(shaped))
}

pub async fn get_translation(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let translation = state.translations.get(id).await.map_err(service_to_api)?;
    Ok(Json(TranslationView::from(&translation)))
}

pub async fn create_translation(
    State(state): State<ApiState>,
    Json(payload): Json<TranslationWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let translation = state
        .translations
        .create(command_from(payload))
        .await
        .map_err(service_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(TranslationView::from(&translation)),
    ))
}

pub async fn update_translation(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TranslationWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let translation = state
        .translations
        .update(id, command_from(payload))
        .await
        .map_err(service_to_api)?;

    Ok(Json(TranslationView::from(&translation)))
}

pub async fn replace_translation_tags(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TranslationTagsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let translation = state
        .translations
        .replace_tags(id, payload.tags)
        .await
        .map_err(service_to_api)?;

    Ok(Json(TranslationView::from(&translation)))
}

pub async fn delete_translation(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .translations
        .delete(id)
        .await
        .map_err(service_to_api)?;
    Ok(Json(MessageResponse::new("Translation deleted")))
}

fn command_from(payload: TranslationWriteRequest) -> TranslationCommand {
    TranslationCommand {
        key: payload.key,
        content: payload.content,
        locale_id: payload.locale_id,
        tags: payload.tags,
    }
}
