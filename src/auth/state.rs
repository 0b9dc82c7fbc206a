// file: src/auth/state.rs
// Opaque OAuth state parameter carrying the (user, room) pair through the
// provider redirect, plus the authorization URL builder.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatePayload {
    pub user_id: String,
    pub room_id: String,
    /// Random per-flow value; makes state values single-use and unguessable.
    pub nonce: String,
}

pub fn encode_state(user_id: &str, room_id: &str) -> SyncResult<String> {
    let payload = StatePayload {
        user_id: user_id.to_string(),
        room_id: room_id.to_string(),
        nonce: Uuid::new_v4().to_string(),
    };
    let json = serde_json::to_vec(&payload)
        .map_err(|e| SyncError::invalid_input(format!("failed to encode state: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_state(state: &str) -> SyncResult<StatePayload> {
    let bytes = URL_SAFE_NO_PAD
        .decode(state)
        .map_err(|e| SyncError::auth_exchange(format!("invalid state parameter: {}", e)))?;
    let payload: StatePayload = serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::auth_exchange(format!("invalid state payload: {}", e)))?;

    if payload.user_id.is_empty() || payload.room_id.is_empty() {
        return Err(SyncError::auth_exchange("state payload missing ids"));
    }
    Ok(payload)
}

/// Authorization redirect URL for connecting a user's calendar to a room.
///
/// `access_type=offline` plus `prompt=consent` makes Google issue a refresh
/// token even for repeat authorizations.
pub fn authorization_url(config: &ProviderConfig, user_id: &str, room_id: &str) -> SyncResult<String> {
    let state = encode_state(user_id, room_id)?;

    let mut url = Url::parse(&config.auth_url)
        .map_err(|e| SyncError::config(format!("invalid auth URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scopes.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("state", &state);

    Ok(url.to_string())
}
