//! Dashboard JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::state::AppState;

/// JWT claims issued by the dashboard's session service
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountClaims {
    /// Account ID
    pub sub: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated account extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    pub account_id: String,
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Sign a token for an account. Sessions are issued elsewhere; this is the
/// matching encoder for tooling and tests.
pub fn create_token(account_id: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = AccountClaims {
        sub: account_id.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify `Authorization: Bearer <jwt>` and attach [`AccountIdentity`]
pub async fn account_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let token_data = jsonwebtoken::decode::<AccountClaims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::invalid_token("Invalid or expired token").into_response()
    })?;

    if token_data.claims.sub.is_empty() {
        return Err(AppError::invalid_token("Token has no subject").into_response());
    }

    request.extensions_mut().insert(AccountIdentity {
        account_id: token_data.claims.sub,
    });

    Ok(next.run(request).await)
}
