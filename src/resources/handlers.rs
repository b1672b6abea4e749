use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use super::service::ResourceService;
use crate::auth::TokenClaims;
use crate::models::{Message, Resource};
use crate::shared::{AppError, AppState};

fn service<R: Resource>(state: &AppState) -> ResourceService<R> {
    ResourceService::new(Arc::clone(&state.store))
}

/// GET /api/{resource}
#[instrument(skip(state), fields(table = R::SCHEMA.name))]
pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Vec<R>>, AppError> {
    Ok(Json(service::<R>(&state).list().await?))
}

/// GET /api/{resource}/:id
#[instrument(skip(state), fields(table = R::SCHEMA.name))]
pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<R>, AppError> {
    Ok(Json(service::<R>(&state).get(&id).await?))
}

/// POST /api/{resource}
#[instrument(skip(state, claims, payload), fields(table = R::SCHEMA.name))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), AppError> {
    let Json(payload) = payload?;
    let record = service::<R>(&state).create(&claims, &payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/{resource}/:id
#[instrument(skip(state, payload), fields(table = R::SCHEMA.name))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service::<R>(&state).update(&id, &payload, false).await?))
}

/// PATCH /api/{resource}/:id
#[instrument(skip(state, payload), fields(table = R::SCHEMA.name))]
pub async fn partial_update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<R>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(service::<R>(&state).update(&id, &payload, true).await?))
}

/// DELETE /api/{resource}/:id
#[instrument(skip(state), fields(table = R::SCHEMA.name))]
pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service::<R>(&state).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/messages/:id/read
#[instrument(skip(state, claims))]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(service::<Message>(&state).mark_read(&claims, &id).await?))
}
