// file: src/database/credentials.rs
use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::CredentialRecord;

pub async fn get(pool: &SqlitePool, user_id: &str) -> Result<Option<CredentialRecord>> {
    let record = sqlx::query_as::<_, CredentialRecord>(
        "SELECT user_id, access_token, refresh_token, access_token_expiry,
                selected_calendar_ids, linked_email, connected_at
         FROM credentials WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Upsert the full record in one statement so a concurrent reader never
/// observes a partially written row.
pub async fn put(pool: &SqlitePool, record: &CredentialRecord) -> Result<()> {
    sqlx::query(
        "INSERT INTO credentials
            (user_id, access_token, refresh_token, access_token_expiry,
             selected_calendar_ids, linked_email, connected_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            access_token_expiry = excluded.access_token_expiry,
            selected_calendar_ids = excluded.selected_calendar_ids,
            linked_email = excluded.linked_email,
            connected_at = excluded.connected_at",
    )
    .bind(&record.user_id)
    .bind(&record.access_token)
    .bind(&record.refresh_token)
    .bind(record.access_token_expiry)
    .bind(&record.selected_calendar_ids)
    .bind(&record.linked_email)
    .bind(record.connected_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &SqlitePool, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM credentials WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_selected_calendars(
    pool: &SqlitePool,
    user_id: &str,
    calendar_ids: &[String],
) -> Result<()> {
    let json = serde_json::to_string(calendar_ids)?;
    let result = sqlx::query("UPDATE credentials SET selected_calendar_ids = ? WHERE user_id = ?")
        .bind(json)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(anyhow::anyhow!("No credentials stored for user: {}", user_id));
    }

    Ok(())
}
