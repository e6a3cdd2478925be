//! Account settings

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResponse};

use super::ApiResult;
use crate::auth::AccountIdentity;
use crate::db;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallApiKeyRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CallApiKeyStatus {
    pub configured: bool,
}

/// PUT /api/settings/call-api-key
pub async fn set_call_api_key(
    State(state): State<AppState>,
    Extension(identity): Extension<AccountIdentity>,
    Json(req): Json<CallApiKeyRequest>,
) -> ApiResult<CallApiKeyStatus> {
    let api_key = req.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::validation("api_key must not be empty")
            .with_detail("field", "api_key")
            .into());
    }

    db::settings::set_call_api_key(
        &state.pool,
        &identity.account_id,
        api_key,
        shared::util::now_millis(),
    )
    .await?;
    tracing::info!(account_id = %identity.account_id, "Call API key updated");

    Ok(AppResponse::success(CallApiKeyStatus { configured: true }))
}
