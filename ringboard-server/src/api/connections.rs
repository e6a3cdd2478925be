//! HubRise connection endpoints

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResponse, ErrorCode};
use shared::models::HubriseConnection;

use super::ApiResult;
use crate::auth::AccountIdentity;
use crate::db;
use crate::hubrise::{connect_location, revoke_location};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

/// GET /api/hubrise/connections
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
) -> ApiResult<Vec<HubriseConnection>> {
    let rows = db::connections::list(&state.pool, &identity.account_id).await?;
    Ok(AppResponse::success(rows))
}

/// POST /api/hubrise/connect
pub async fn connect(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Json(req): Json<ConnectRequest>,
) -> ApiResult<HubriseConnection> {
    let conn = connect_location(
        &state.pool,
        state.hubrise.as_ref(),
        &identity.account_id,
        &req.code,
        &state.webhook_callback_url,
    )
    .await?;
    Ok(AppResponse::success(conn))
}

/// DELETE /api/hubrise/connections/{location_id}
pub async fn revoke(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Path(location_id): Path<String>,
) -> ApiResult<RevokeResponse> {
    if !revoke_location(&state.pool, &identity.account_id, &location_id).await? {
        return Err(AppError::new(ErrorCode::IntegrationNotConnected)
            .with_detail("location_id", location_id)
            .into());
    }
    Ok(AppResponse::success(RevokeResponse { revoked: true }))
}
