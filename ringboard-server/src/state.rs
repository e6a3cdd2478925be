//! Application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::calls::{BackfillPolicy, CallApi, VapiClient};
use crate::config::Config;
use crate::db::DbService;
use crate::hubrise::{HubriseApi, HubriseClient};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Call platform client
    pub call_api: Arc<dyn CallApi>,
    /// HubRise client
    pub hubrise: Arc<dyn HubriseApi>,
    /// JWT secret for dashboard authentication
    pub jwt_secret: String,
    /// Callback URL registered with HubRise
    pub webhook_callback_url: String,
    pub backfill: BackfillPolicy,
}

impl AppState {
    /// Open the database and build the real upstream clients
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;

        let call_api = Arc::new(VapiClient::new(&config.call_api_url)?);
        let hubrise = Arc::new(HubriseClient::new(
            &config.hubrise_oauth_url,
            &config.hubrise_api_url,
            &config.hubrise_client_id,
            &config.hubrise_client_secret,
        )?);

        Ok(Self {
            pool: db.pool,
            call_api,
            hubrise,
            jwt_secret: config.jwt_secret.clone(),
            webhook_callback_url: config.webhook_callback_url(),
            backfill: BackfillPolicy::default(),
        })
    }
}
