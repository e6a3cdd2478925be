//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed | Self::CredentialMissing | Self::WebhookRejected => {
                StatusCode::BAD_REQUEST
            }
            Self::NotAuthenticated | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::IntegrationNotConnected | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert_eq!(
            ErrorCode::CredentialMissing.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::TokenInvalid.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::IntegrationNotConnected.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(
            ErrorCode::UpstreamError.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
