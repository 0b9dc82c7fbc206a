// Remote calendar provider module
// Trait seam consumed by the reconciliation engine, plus the Google
// implementation and its wire types

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub mod google;

pub use google::GoogleCalendarClient;

/// Start or end of a remote event: either a date-only value (all-day) or a
/// timezone-qualified instant (timed). Exactly one of the two is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteEventTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RemoteEventTime {
    pub fn all_day(date: NaiveDate) -> Self {
        Self { date: Some(date), ..Default::default() }
    }

    pub fn timed(instant: DateTime<FixedOffset>, time_zone: &str) -> Self {
        Self {
            date_time: Some(instant),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteAttendee {
    pub email: String,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Provider-side event representation.
///
/// `id` is empty in outbound create payloads and assigned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteEvent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: RemoteEventTime,
    pub end: RemoteEventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<RemoteAttendee>,
}

impl RemoteEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCalendar {
    pub id: String,
    #[serde(rename = "summary")]
    pub name: String,
    #[serde(default)]
    pub primary: bool,
}

/// The four remote operations plus calendar discovery.
///
/// Implementations are stateless: every call takes a caller-supplied valid
/// access token, and HTTP failures are normalized into `ProviderError`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn list_calendars(&self, token: &str) -> Result<Vec<RemoteCalendar>, ProviderError>;

    /// Fully materialized listing for the window; pagination is followed
    /// internally and cancelled events are excluded.
    async fn list_events(
        &self,
        token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>, ProviderError>;

    async fn create_event(
        &self,
        token: &str,
        calendar_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, ProviderError>;

    async fn update_event(
        &self,
        token: &str,
        calendar_id: &str,
        remote_event_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, ProviderError>;

    /// Deleting an event that is already gone is success, not failure.
    async fn delete_event(
        &self,
        token: &str,
        calendar_id: &str,
        remote_event_id: &str,
    ) -> Result<(), ProviderError>;
}
