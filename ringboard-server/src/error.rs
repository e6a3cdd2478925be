//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer and upstream-client errors into the API-layer
//! `AppError`, so handlers can use `?` directly.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::calls::ReconcileError;
use crate::hubrise::ConnectError;
use crate::upstream::UpstreamError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: database/infrastructure errors (logged, mapped to InternalError)
/// - `Upstream`: provider failures (logged, mapped to a generic 502)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    Upstream(UpstreamError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<UpstreamError> for ServiceError {
    fn from(e: UpstreamError) -> Self {
        ServiceError::Upstream(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ReconcileError> for ServiceError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::MissingCredential => ServiceError::App(AppError::credential_missing()),
            ReconcileError::Upstream(e) => ServiceError::Upstream(e),
            ReconcileError::Db(e) => e.into(),
        }
    }
}

impl From<ConnectError> for ServiceError {
    fn from(e: ConnectError) -> Self {
        match e {
            ConnectError::EmptyCode => {
                ServiceError::App(AppError::validation("Authorization code is required"))
            }
            ConnectError::MissingLocation => ServiceError::Upstream(
                UpstreamError::InvalidResponse("token grant without location_id".into()),
            ),
            ConnectError::Upstream(e) => ServiceError::Upstream(e),
            ConnectError::Db(e) => e.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::InternalError)
            }
            ServiceError::Upstream(upstream_err) => {
                tracing::error!(error = %upstream_err, "Upstream provider error");
                AppError::upstream()
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_errors_map_to_api_codes() {
        let err: AppError = ServiceError::from(ReconcileError::MissingCredential).into();
        assert_eq!(err.code, ErrorCode::CredentialMissing);

        let upstream = UpstreamError::Status {
            status: 401,
            body: "secret detail".into(),
        };
        let err: AppError = ServiceError::from(ReconcileError::Upstream(upstream)).into();
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert!(!err.message.contains("secret detail"));
    }

    #[test]
    fn test_connect_errors_map_to_api_codes() {
        let err: AppError = ServiceError::from(ConnectError::EmptyCode).into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let err: AppError = ServiceError::from(ConnectError::MissingLocation).into();
        assert_eq!(err.code, ErrorCode::UpstreamError);
    }
}
