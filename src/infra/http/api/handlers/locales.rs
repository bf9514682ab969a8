//! Locale handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lexicon_api_types::{LocaleWriteRequest, MessageResponse};

use crate::application::locales::LocaleCommand;

use super::service_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn list_locales(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let locales = state.locales.list().await.map_err(service_to_api)?;
    Ok(Json(locales))
}

pub async fn get_locale(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.locales.get(id).await.map_err(service_to_api)?;
    Ok(Json(locale))
}

pub async fn create_locale(
    State(state): State<ApiState>,
    Json(payload): Json<LocaleWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = LocaleCommand {
        code: payload.code,
        name: payload.name,
    };

    let locale = state
        .locales
        .create(command)
        .await
        .map_err(service_to_api)?;

    Ok((StatusCode::CREATED, Json(locale)))
}

pub async fn update_locale(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<LocaleWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = LocaleCommand {
        code: payload.code,
        name: payload.name,
    };

    let locale = state
        .locales
        .update(id, command)
        .await
        .map_err(service_to_api)?;

    Ok(Json(locale))
}

pub async fn delete_locale(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.locales.delete(id).await.map_err(service_to_api)?;
    Ok(Json(MessageResponse::new("Locale deleted")))
}
