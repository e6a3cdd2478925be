//! Error codes surfaced by the Ringboard API

use std::fmt;

/// Numeric error code, serialized as a bare `u16` in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // 0xxx: General
    ValidationFailed = 2,

    // 1xxx: Auth
    NotAuthenticated = 1001,
    TokenInvalid = 1004,

    // 3xxx: Integration
    /// No stored call platform API key
    CredentialMissing = 3001,
    /// No active HubRise connection for the location
    IntegrationNotConnected = 3002,
    /// Upstream provider unreachable or returned an error
    UpstreamError = 3003,
    /// Webhook payload could not be processed. Logged, never returned.
    WebhookRejected = 3005,

    // 4xxx: Order
    OrderNotFound = 4001,

    // 9xxx: System
    InternalError = 9001,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message for the code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::CredentialMissing => {
                "No call platform API key configured. Add your API key in settings and try again"
            }
            ErrorCode::IntegrationNotConnected => "No active HubRise connection",
            ErrorCode::UpstreamError => "Upstream provider request failed",
            ErrorCode::WebhookRejected => "Webhook payload rejected",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
