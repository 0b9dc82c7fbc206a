// file: src/database/events.rs
use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::{EventPatch, EventSource, Field, RoomEvent};

const EVENT_COLUMNS: &str = "id, room_id, title, date, start_time, end_time, description, \
     all_day, participants, source, remote_event_id, remote_calendar_id, \
     synced_at, created_by, created_at, updated_at";

pub async fn insert(pool: &SqlitePool, event: &RoomEvent) -> Result<()> {
    sqlx::query(
        "INSERT INTO room_events
            (id, room_id, title, date, start_time, end_time, description,
             all_day, participants, source, remote_event_id, remote_calendar_id,
             synced_at, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(&event.room_id)
    .bind(&event.title)
    .bind(event.date)
    .bind(&event.start_time)
    .bind(&event.end_time)
    .bind(&event.description)
    .bind(event.all_day)
    .bind(&event.participants)
    .bind(&event.source)
    .bind(&event.remote_event_id)
    .bind(&event.remote_calendar_id)
    .bind(event.synced_at)
    .bind(&event.created_by)
    .bind(event.created_at)
    .bind(event.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, event_id: &str) -> Result<Option<RoomEvent>> {
    let event = sqlx::query_as::<_, RoomEvent>(&format!(
        "SELECT {} FROM room_events WHERE id = ?",
        EVENT_COLUMNS
    ))
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    Ok(event)
}

/// Apply a sparse update. `Keep` fields are left out of the statement
/// entirely; `Clear` writes NULL; `Set` binds the new value.
pub async fn patch(pool: &SqlitePool, event_id: &str, patch: &EventPatch) -> Result<()> {
    let mut sets: Vec<String> = Vec::new();

    if patch.title.is_some() {
        sets.push("title = ?".to_string());
    }
    if patch.date.is_some() {
        sets.push("date = ?".to_string());
    }
    if patch.all_day.is_some() {
        sets.push("all_day = ?".to_string());
    }
    for (column, field) in [
        ("start_time", &patch.start_time),
        ("end_time", &patch.end_time),
        ("description", &patch.description),
        ("remote_event_id", &patch.remote_event_id),
        ("remote_calendar_id", &patch.remote_calendar_id),
    ] {
        match field {
            Field::Keep => {}
            Field::Clear => sets.push(format!("{} = NULL", column)),
            Field::Set(_) => sets.push(format!("{} = ?", column)),
        }
    }
    match &patch.synced_at {
        Field::Keep => {}
        Field::Clear => sets.push("synced_at = NULL".to_string()),
        Field::Set(_) => sets.push("synced_at = ?".to_string()),
    }

    if sets.is_empty() {
        return Ok(());
    }
    sets.push("updated_at = CURRENT_TIMESTAMP".to_string());

    let sql = format!("UPDATE room_events SET {} WHERE id = ?", sets.join(", "));
    let mut query = sqlx::query(&sql);

    if let Some(title) = &patch.title {
        query = query.bind(title);
    }
    if let Some(date) = patch.date {
        query = query.bind(date);
    }
    if let Some(all_day) = patch.all_day {
        query = query.bind(all_day);
    }
    for field in [
        &patch.start_time,
        &patch.end_time,
        &patch.description,
        &patch.remote_event_id,
        &patch.remote_calendar_id,
    ] {
        if let Field::Set(value) = field {
            query = query.bind(value);
        }
    }
    if let Field::Set(synced_at) = &patch.synced_at {
        query = query.bind(*synced_at);
    }

    let result = query.bind(event_id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(anyhow::anyhow!("Event not found: {}", event_id));
    }

    Ok(())
}

pub async fn delete(pool: &SqlitePool, event_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM room_events WHERE id = ?")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// The previous mirror set for one calendar: events imported into this room
/// from this calendar by this user.
pub async fn get_mirrors(
    pool: &SqlitePool,
    room_id: &str,
    remote_calendar_id: &str,
    created_by: &str,
) -> Result<Vec<RoomEvent>> {
    let events = sqlx::query_as::<_, RoomEvent>(&format!(
        "SELECT {} FROM room_events
         WHERE room_id = ? AND source = ? AND remote_calendar_id = ? AND created_by = ?
         ORDER BY date ASC",
        EVENT_COLUMNS
    ))
    .bind(room_id)
    .bind(EventSource::RemoteMirror.as_str())
    .bind(remote_calendar_id)
    .bind(created_by)
    .fetch_all(pool)
    .await?;

    Ok(events)
}

/// Locally authored events for a (room, author) pair, exported or not.
pub async fn get_local(
    pool: &SqlitePool,
    room_id: &str,
    created_by: &str,
) -> Result<Vec<RoomEvent>> {
    let events = sqlx::query_as::<_, RoomEvent>(&format!(
        "SELECT {} FROM room_events
         WHERE room_id = ? AND source = ? AND created_by = ?
         ORDER BY date ASC",
        EVENT_COLUMNS
    ))
    .bind(room_id)
    .bind(EventSource::Local.as_str())
    .bind(created_by)
    .fetch_all(pool)
    .await?;

    Ok(events)
}
