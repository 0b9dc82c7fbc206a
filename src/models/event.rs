// file: src/models/event.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Where a room event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    Local,
    RemoteMirror,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Local => "local",
            EventSource::RemoteMirror => "remote-mirror",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "local" => Ok(EventSource::Local),
            "remote-mirror" => Ok(EventSource::RemoteMirror),
            other => Err(format!("Unknown event source: {}", other)),
        }
    }
}

/// One event in a room, either authored locally or mirrored from the
/// user's external calendar.
///
/// Times are wall-clock "HH:MM" strings; both present or both absent unless
/// the event is all-day. A mirrored or exported event carries the
/// (remote_calendar_id, remote_event_id) pair that keys reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoomEvent {
    pub id: String,
    pub room_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub all_day: bool,
    /// JSON array of member ids.
    pub participants: String,
    pub source: String,
    pub remote_event_id: Option<String>,
    pub remote_calendar_id: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomEvent {
    pub fn source(&self) -> Result<EventSource, String> {
        EventSource::parse(&self.source)
    }

    pub fn is_mirror(&self) -> bool {
        self.source == EventSource::RemoteMirror.as_str()
    }

    /// A locally authored event that has been exported and carries a
    /// remote identifier.
    pub fn is_linked(&self) -> bool {
        self.source == EventSource::Local.as_str() && self.remote_event_id.is_some()
    }

    pub fn participant_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.participants).unwrap_or_default()
    }
}

/// One field of a sparse update.
///
/// `Keep` leaves the stored value unchanged, `Clear` writes NULL, and
/// `Set` replaces it. Omission is never encoded as a sentinel value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Field<T> {
    pub fn set(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Set(v),
            None => Field::Clear,
        }
    }
}

/// Sparse update against a room event record.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Field<String>,
    pub end_time: Field<String>,
    pub description: Field<String>,
    pub all_day: Option<bool>,
    pub remote_event_id: Field<String>,
    pub remote_calendar_id: Field<String>,
    pub synced_at: Field<DateTime<Utc>>,
}
