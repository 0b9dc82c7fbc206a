//! Provider configuration module
//!
//! OAuth client settings for the Google Calendar integration. Credentials
//! come from the environment; endpoint URLs default to Google's production
//! endpoints but stay overridable so tests can point at a local server.

use crate::error::{SyncError, SyncResult};
use log::info;
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub revoke_url: String,
    pub api_base_url: String,
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    /// Build config from GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET /
    /// GOOGLE_REDIRECT_URI environment variables.
    pub fn from_env() -> SyncResult<Self> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| SyncError::config("GOOGLE_CLIENT_ID is not set"))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| SyncError::config("GOOGLE_CLIENT_SECRET is not set"))?;
        let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:3000/api/google/callback".to_string());

        let config = Self::new(client_id, client_secret, redirect_uri);
        config.validate()?;
        Ok(config)
    }

    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            revoke_url: GOOGLE_REVOKE_URL.to_string(),
            api_base_url: GOOGLE_API_BASE_URL.to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/calendar".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
            ],
        }
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.client_id.is_empty() {
            return Err(SyncError::config("client_id is empty"));
        }
        if self.client_secret.is_empty() {
            return Err(SyncError::config("client_secret is empty"));
        }

        for (name, value) in [
            ("redirect_uri", &self.redirect_uri),
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("revoke_url", &self.revoke_url),
            ("api_base_url", &self.api_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| SyncError::config(format!("invalid {}: {}", name, e)))?;
        }

        info!("Provider configuration validated");
        Ok(())
    }
}
