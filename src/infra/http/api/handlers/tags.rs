//! Tags handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use lexicon_api_types::{MessageResponse, TagWriteRequest};

use crate::application::tags::TagCommand;

use super::service_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::state::ApiState;

pub async fn list_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tags.list().await.map_err(service_to_api)?;
    Ok(Json(tags))
}

pub async fn get_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tags.get(id).await.map_err(service_to_api)?;
    Ok(Json(tag))
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Json(payload): Json<TagWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .create(TagCommand { name: payload.name })
        .await
        .map_err(service_to_api)?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TagWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .update(id, TagCommand { name: payload.name })
        .await
        .map_err(service_to_api)?;

    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.tags.delete(id).await.map_err(service_to_api)?;
    Ok(Json(MessageResponse::new("Tag deleted")))
}
