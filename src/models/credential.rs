// file: src/models/credential.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Delegated-access credentials for one user's Google account.
///
/// Mutated only by the token lifecycle manager (refresh) and by the OAuth
/// connect/disconnect flows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CredentialRecord {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expiry: DateTime<Utc>,
    /// JSON array of calendar ids, ordered. Defaults to ["primary"].
    pub selected_calendar_ids: String,
    pub linked_email: String,
    pub connected_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        user_id: String,
        access_token: String,
        refresh_token: String,
        access_token_expiry: DateTime<Utc>,
        linked_email: String,
    ) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            access_token_expiry,
            selected_calendar_ids: r#"["primary"]"#.to_string(),
            linked_email,
            connected_at: Utc::now(),
        }
    }

    pub fn calendar_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.selected_calendar_ids).unwrap_or_else(|_| vec![
            "primary".to_string(),
        ])
    }

    pub fn set_calendar_ids(&mut self, ids: &[String]) {
        self.selected_calendar_ids =
            serde_json::to_string(ids).unwrap_or_else(|_| r#"["primary"]"#.to_string());
    }

    /// True when the access token is still valid past the given safety
    /// margin and can be handed out without a refresh.
    pub fn token_valid_for(&self, margin: chrono::Duration) -> bool {
        self.access_token_expiry > Utc::now() + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_defaults_to_primary_calendar() {
        let record = CredentialRecord::new(
            "user-1".to_string(),
            "access".to_string(),
            "refresh".to_string(),
            Utc::now() + Duration::hours(1),
            "user@example.com".to_string(),
        );

        assert_eq!(record.calendar_ids(), vec!["primary".to_string()]);
        assert_eq!(record.linked_email, "user@example.com");
    }

    #[test]
    fn test_set_calendar_ids_round_trips() {
        let mut record = CredentialRecord::new(
            "user-1".to_string(),
            "access".to_string(),
            "refresh".to_string(),
            Utc::now(),
            "user@example.com".to_string(),
        );

        record.set_calendar_ids(&["primary".to_string(), "family123".to_string()]);
        assert_eq!(
            record.calendar_ids(),
            vec!["primary".to_string(), "family123".to_string()]
        );
    }

    #[test]
    fn test_token_valid_for_margin() {
        let mut record = CredentialRecord::new(
            "user-1".to_string(),
            "access".to_string(),
            "refresh".to_string(),
            Utc::now() + Duration::seconds(30),
            "user@example.com".to_string(),
        );

        // 30s left: valid with no margin, not valid with a 60s margin
        assert!(record.token_valid_for(Duration::zero()));
        assert!(!record.token_valid_for(Duration::seconds(60)));

        record.access_token_expiry = Utc::now() - Duration::seconds(1);
        assert!(!record.token_valid_for(Duration::zero()));
    }
}
