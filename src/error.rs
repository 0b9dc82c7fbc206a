use thiserror::Error;

/// Normalized provider API failures.
///
/// Every HTTP failure from the calendar provider is collapsed into one of
/// these variants so the reconciliation engine never inspects raw status
/// codes.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unauthorized: access token rejected by provider")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Provider server error ({status}): {message}")]
    RemoteServerError { status: u16, message: String },

    #[error("Provider client error ({status}): {message}")]
    RemoteClientError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Retryable failures: rate limiting, provider 5xx, and transport errors.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::RemoteServerError { .. } | Self::Network(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Authorization exchange failed: {0}")]
    AuthExchange(String),

    #[error("Reauthorization required: no stored credentials for user")]
    ReauthorizationRequired,

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SyncError {
    pub fn auth_exchange<S: Into<String>>(msg: S) -> Self {
        Self::AuthExchange(msg.into())
    }

    pub fn token_refresh_failed<S: Into<String>>(msg: S) -> Self {
        Self::TokenRefreshFailed(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Terminal auth failures mean the user's connection is lost and a
    /// reconnect prompt should be surfaced; callers must not retry.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            Self::ReauthorizationRequired | Self::TokenRefreshFailed(_) | Self::AuthExchange(_)
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::RemoteServerError { status: 503, message: "unavailable".into() }
            .is_transient());
        assert!(ProviderError::Network("connection reset".into()).is_transient());
        assert!(!ProviderError::Unauthorized.is_transient());
        assert!(!ProviderError::NotFound("event".into()).is_transient());
        assert!(!ProviderError::RemoteClientError { status: 400, message: "bad".into() }
            .is_transient());
    }

    #[test]
    fn test_needs_reconnect() {
        assert!(SyncError::ReauthorizationRequired.needs_reconnect());
        assert!(SyncError::token_refresh_failed("revoked").needs_reconnect());
        assert!(!SyncError::Provider(ProviderError::RateLimited).needs_reconnect());
    }
}
