use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::AuthService,
    types::{
        AccessTokenResponse, AccountResponse, RefreshRequest, RegisterRequest, TokenPairResponse,
        TokenRequest,
    },
};
use crate::shared::{AppError, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.account_repository),
        state.token_config.clone(),
    )
}

/// POST /api/register
#[instrument(name = "register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let Json(request) = payload?;
    let account = auth_service(&state).register(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// POST /api/token
///
/// Returns an access/refresh token pair for valid credentials
#[instrument(name = "obtain_token", skip(state, payload))]
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let Json(request) = payload?;
    let pair = auth_service(&state).obtain_token(request).await?;
    Ok(Json(pair))
}

/// POST /api/token/refresh
#[instrument(name = "refresh_token", skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let Json(request) = payload?;
    let access = auth_service(&state).refresh_token(request).await?;
    Ok(Json(access))
}
