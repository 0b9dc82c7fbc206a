// file: src/auth/tokens.rs
// Token lifecycle manager: exchanges authorization codes, refreshes expired
// access tokens before every remote call, and persists the results.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::database::Database;
use crate::error::{SyncError, SyncResult};
use crate::http_config::HttpConfig;
use crate::models::CredentialRecord;

/// Seconds of remaining validity below which a token is refreshed rather
/// than handed out.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Token endpoint response. `refresh_token` is only present on the first
/// authorization; refreshes never rotate it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl RawTokenResponse {
    pub fn expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600))
    }
}

pub struct TokenManager {
    db: Database,
    config: ProviderConfig,
    http: Client,
}

impl TokenManager {
    pub fn new(db: Database, config: ProviderConfig) -> SyncResult<Self> {
        let http = HttpConfig::oauth()
            .build_client()
            .map_err(|e| SyncError::config(format!("Failed to build OAuth client: {}", e)))?;
        Ok(Self { db, config, http })
    }

    /// One-shot exchange of an authorization code at the provider's token
    /// endpoint.
    pub async fn exchange_authorization_code(&self, code: &str) -> SyncResult<RawTokenResponse> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| SyncError::auth_exchange(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::auth_exchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json::<RawTokenResponse>()
            .await
            .map_err(|e| SyncError::auth_exchange(format!("malformed token response: {}", e)))
    }

    /// Return a usable access token for the user, refreshing transparently
    /// when the cached one is within the expiry margin.
    pub async fn get_valid_access_token(&self, user_id: &str) -> SyncResult<String> {
        let record = self
            .db
            .get_credentials(user_id)
            .await?
            .ok_or(SyncError::ReauthorizationRequired)?;

        if record.token_valid_for(Duration::seconds(EXPIRY_MARGIN_SECONDS)) {
            debug!("Cached access token still valid for user {}", user_id);
            return Ok(record.access_token);
        }

        self.refresh_and_persist(record).await
    }

    /// Refresh regardless of cached expiry. Used for the single retry after
    /// the provider rejects a token the store considered valid.
    pub async fn force_refresh(&self, user_id: &str) -> SyncResult<String> {
        let record = self
            .db
            .get_credentials(user_id)
            .await?
            .ok_or(SyncError::ReauthorizationRequired)?;

        self.refresh_and_persist(record).await
    }

    async fn refresh_and_persist(&self, mut record: CredentialRecord) -> SyncResult<String> {
        debug!("Refreshing access token for user {}", record.user_id);

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("refresh_token", record.refresh_token.as_str()),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| {
                SyncError::token_refresh_failed(format!("refresh endpoint unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Revoked or invalid grant: the connection is lost. Callers
            // surface a reconnect prompt, never retry.
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::token_refresh_failed(format!(
                "refresh rejected ({}): {}",
                status, body
            )));
        }

        let tokens: RawTokenResponse = response.json().await.map_err(|e| {
            SyncError::token_refresh_failed(format!("malformed refresh response: {}", e))
        })?;

        record.access_token = tokens.access_token.clone();
        record.access_token_expiry = tokens.expiry();
        self.db.put_credentials(&record).await?;

        info!("Refreshed access token for user {}", record.user_id);
        Ok(tokens.access_token)
    }

    /// Persist a freshly authorized connection. The exchange response must
    /// carry a refresh token or the connection would be unusable after the
    /// first expiry.
    pub async fn save_credentials(
        &self,
        user_id: &str,
        tokens: &RawTokenResponse,
        linked_email: &str,
    ) -> SyncResult<CredentialRecord> {
        let refresh_token = match tokens.refresh_token.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                return Err(SyncError::auth_exchange(
                    "provider issued no refresh token; re-run authorization with consent prompt",
                ))
            }
        };

        let record = CredentialRecord::new(
            user_id.to_string(),
            tokens.access_token.clone(),
            refresh_token,
            tokens.expiry(),
            linked_email.to_string(),
        );
        self.db.put_credentials(&record).await?;

        info!("Stored Google connection for user {} ({})", user_id, linked_email);
        Ok(record)
    }

    /// Best-effort revocation, then unconditional credential deletion. The
    /// local side must never stay "connected" to a token the provider may
    /// have already invalidated.
    pub async fn revoke_and_forget(&self, user_id: &str) -> SyncResult<()> {
        if let Some(record) = self.db.get_credentials(user_id).await? {
            let result = self
                .http
                .post(&self.config.revoke_url)
                .form(&[("token", record.refresh_token.as_str())])
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    debug!("Revoked provider grant for user {}", user_id);
                }
                Ok(response) => {
                    warn!(
                        "Provider revoke returned {} for user {}; deleting credentials anyway",
                        response.status(),
                        user_id
                    );
                }
                Err(e) => {
                    warn!(
                        "Provider revoke failed for user {}: {}; deleting credentials anyway",
                        user_id, e
                    );
                }
            }
        }

        self.db.delete_credentials(user_id).await?;
        info!("Disconnected calendar for user {}", user_id);
        Ok(())
    }
}
