// file: src/database.rs

use anyhow::{Context, Result};
use log::info;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Sqlite,
};

// Declare submodules
pub mod credentials;
pub mod events;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_path: &str) -> Result<Self> {
        // Create database if it doesn't exist
        let db_exists = Sqlite::database_exists(db_path)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database");
            Sqlite::create_database(db_path)
                .await
                .context("Failed to create database")?;
        }

        // Connect to database
        let pool = SqlitePool::connect(db_path)
            .await
            .context("Failed to connect to database")?;

        // Run schema migrations
        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    /// In-memory database, used by tests and ephemeral tooling. A single
    /// connection: every pooled connection to `:memory:` would otherwise
    /// open its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .context("Failed to open in-memory database")?;
        run_schema(&pool).await.context("Failed to run database schema")?;
        Ok(Database { pool })
    }

    // --- Credential Delegates ---

    pub async fn get_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<crate::models::CredentialRecord>> {
        credentials::get(&self.pool, user_id).await
    }

    pub async fn put_credentials(&self, record: &crate::models::CredentialRecord) -> Result<()> {
        credentials::put(&self.pool, record).await
    }

    pub async fn delete_credentials(&self, user_id: &str) -> Result<()> {
        credentials::delete(&self.pool, user_id).await
    }

    pub async fn update_selected_calendars(
        &self,
        user_id: &str,
        calendar_ids: &[String],
    ) -> Result<()> {
        credentials::update_selected_calendars(&self.pool, user_id, calendar_ids).await
    }

    // --- Event Delegates ---

    pub async fn insert_event(&self, event: &crate::models::RoomEvent) -> Result<()> {
        events::insert(&self.pool, event).await
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<crate::models::RoomEvent>> {
        events::get(&self.pool, event_id).await
    }

    pub async fn patch_event(
        &self,
        event_id: &str,
        patch: &crate::models::EventPatch,
    ) -> Result<()> {
        events::patch(&self.pool, event_id, patch).await
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        events::delete(&self.pool, event_id).await
    }

    pub async fn get_mirror_events(
        &self,
        room_id: &str,
        remote_calendar_id: &str,
        created_by: &str,
    ) -> Result<Vec<crate::models::RoomEvent>> {
        events::get_mirrors(&self.pool, room_id, remote_calendar_id, created_by).await
    }

    pub async fn get_local_events(
        &self,
        room_id: &str,
        created_by: &str,
    ) -> Result<Vec<crate::models::RoomEvent>> {
        events::get_local(&self.pool, room_id, created_by).await
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();
    let mut in_trigger = false;

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        if trimmed.to_uppercase().starts_with("CREATE TRIGGER") {
            in_trigger = true;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            if in_trigger {
                if trimmed.to_uppercase() == "END;" {
                    in_trigger = false;
                    sqlx::query(&current_statement).execute(pool).await?;
                    current_statement.clear();
                }
            } else {
                sqlx::query(&current_statement).execute(pool).await?;
                current_statement.clear();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CredentialRecord;
    use chrono::{Duration, Utc};

    async fn create_test_database() -> Database {
        Database::in_memory().await.unwrap()
    }

    fn test_credentials(user_id: &str) -> CredentialRecord {
        CredentialRecord::new(
            user_id.to_string(),
            "access-token".to_string(),
            "refresh-token".to_string(),
            Utc::now() + Duration::hours(1),
            "user@example.com".to_string(),
        )
    }

    #[tokio::test]
    async fn test_database_in_memory() {
        let db = create_test_database().await;
        assert!(!db.pool.is_closed());
    }

    #[tokio::test]
    async fn test_database_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = format!("sqlite://{}", dir.path().join("rooms.db").display());

        let db = Database::new(&path).await.unwrap();
        db.put_credentials(&test_credentials("user-1")).await.unwrap();
        db.pool.close().await;

        let reopened = Database::new(&path).await.unwrap();
        let record = reopened.get_credentials("user-1").await.unwrap().unwrap();
        assert_eq!(record.linked_email, "user@example.com");
    }

    #[tokio::test]
    async fn test_put_and_get_credentials() {
        let db = create_test_database().await;
        db.put_credentials(&test_credentials("user-1")).await.unwrap();

        let record = db.get_credentials("user-1").await.unwrap().unwrap();
        assert_eq!(record.access_token, "access-token");
        assert_eq!(record.linked_email, "user@example.com");
    }

    #[tokio::test]
    async fn test_get_credentials_absent() {
        let db = create_test_database().await;
        assert!(db.get_credentials("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_credentials() {
        let db = create_test_database().await;
        db.put_credentials(&test_credentials("user-1")).await.unwrap();
        db.delete_credentials("user-1").await.unwrap();
        assert!(db.get_credentials("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_selected_calendars() {
        let db = create_test_database().await;
        db.put_credentials(&test_credentials("user-1")).await.unwrap();

        db.update_selected_calendars(
            "user-1",
            &["primary".to_string(), "family123".to_string()],
        )
        .await
        .unwrap();

        let record = db.get_credentials("user-1").await.unwrap().unwrap();
        assert_eq!(record.calendar_ids(), vec!["primary", "family123"]);
    }
}
