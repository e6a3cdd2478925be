//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for dashboard bearer tokens
    pub jwt_secret: String,
    pub hubrise_client_id: String,
    pub hubrise_client_secret: String,
    /// HubRise OAuth host (token exchange)
    pub hubrise_oauth_url: String,
    /// HubRise REST API host
    pub hubrise_api_url: String,
    /// Call platform REST API host
    pub call_api_url: String,
    /// Externally reachable base URL, used to build the webhook callback
    pub public_base_url: String,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:ringboard.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            hubrise_client_id: Self::require_secret("HUBRISE_CLIENT_ID", &environment)?,
            hubrise_client_secret: Self::require_secret("HUBRISE_CLIENT_SECRET", &environment)?,
            hubrise_oauth_url: std::env::var("HUBRISE_OAUTH_URL")
                .unwrap_or_else(|_| "https://manager.hubrise.com".into()),
            hubrise_api_url: std::env::var("HUBRISE_API_URL")
                .unwrap_or_else(|_| "https://api.hubrise.com".into()),
            call_api_url: std::env::var("CALL_API_URL")
                .unwrap_or_else(|_| "https://api.vapi.ai".into()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            log_json: std::env::var("LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            environment,
        })
    }

    /// Callback URL registered with HubRise for order events
    pub fn webhook_callback_url(&self) -> String {
        format!(
            "{}/api/webhooks/hubrise",
            self.public_base_url.trim_end_matches('/')
        )
    }
}
