//! Event translator
//!
//! Pure, bidirectional mapping between room events and the provider's event
//! representation. No I/O; participant resolution happens against a
//! caller-supplied member directory.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};
use crate::models::RoomEvent;
use crate::provider::{RemoteAttendee, RemoteEvent, RemoteEventTime};

/// Fixed placeholder for remote events without a title, so downstream
/// display never shows a blank.
pub const UNTITLED: &str = "Untitled event";

const WALL_CLOCK_FORMAT: &str = "%H:%M";

/// The translatable subset of a room event, as produced from a remote
/// event. Identity and bookkeeping fields are the reconciler's business.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEventFields {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub all_day: bool,
}

/// Map a room event outward.
///
/// All-day events become date-only ranges with an exclusive end one day
/// after the start. Timed events become timezone-qualified instants.
/// Participants resolve to attendee emails through `directory`; ids with no
/// entry are omitted, never an error.
pub fn to_remote(
    event: &RoomEvent,
    tz: Tz,
    directory: &HashMap<String, String>,
) -> SyncResult<RemoteEvent> {
    let (start, end) = if event.all_day {
        (
            RemoteEventTime::all_day(event.date),
            RemoteEventTime::all_day(event.date + Duration::days(1)),
        )
    } else {
        let (start_time, end_time) = match (&event.start_time, &event.end_time) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                return Err(SyncError::invalid_input(format!(
                    "timed event {} must carry both start and end times",
                    event.id
                )))
            }
        };
        (
            timed_instant(event.date, start_time, tz)?,
            timed_instant(event.date, end_time, tz)?,
        )
    };

    let attendees = event
        .participant_ids()
        .iter()
        .filter_map(|member_id| directory.get(member_id))
        .map(|email| RemoteAttendee { email: email.clone(), display_name: None })
        .collect();

    Ok(RemoteEvent {
        id: event.remote_event_id.clone().unwrap_or_default(),
        summary: Some(event.title.clone()),
        description: event.description.clone(),
        start,
        end,
        status: None,
        attendees,
    })
}

/// Map a remote event inward.
///
/// A date-only event becomes all-day with no wall-clock times; a timed
/// event carries both. A missing or empty remote title maps to the fixed
/// placeholder.
pub fn to_local(remote: &RemoteEvent, tz: Tz) -> SyncResult<LocalEventFields> {
    let title = match remote.summary.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNTITLED.to_string(),
    };

    if let Some(date) = remote.start.date {
        return Ok(LocalEventFields {
            title,
            date,
            start_time: None,
            end_time: None,
            description: remote.description.clone(),
            all_day: true,
        });
    }

    let start = remote.start.date_time.ok_or_else(|| {
        SyncError::invalid_input(format!("remote event {} has neither date nor dateTime", remote.id))
    })?;
    let end = remote.end.date_time.ok_or_else(|| {
        SyncError::invalid_input(format!("remote event {} has no end dateTime", remote.id))
    })?;

    let local_start = start.with_timezone(&tz);
    let local_end = end.with_timezone(&tz);

    Ok(LocalEventFields {
        title,
        date: local_start.date_naive(),
        start_time: Some(local_start.format(WALL_CLOCK_FORMAT).to_string()),
        end_time: Some(local_end.format(WALL_CLOCK_FORMAT).to_string()),
        description: remote.description.clone(),
        all_day: false,
    })
}

fn timed_instant(date: NaiveDate, wall_clock: &str, tz: Tz) -> SyncResult<RemoteEventTime> {
    let time = NaiveTime::parse_from_str(wall_clock, WALL_CLOCK_FORMAT)
        .map_err(|e| SyncError::invalid_input(format!("bad wall-clock time '{}': {}", wall_clock, e)))?;

    let local = tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| {
            SyncError::invalid_input(format!("time {} does not exist on {} in {}", wall_clock, date, tz))
        })?;

    Ok(RemoteEventTime::timed(local.fixed_offset(), tz.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::America::{New_York, Phoenix};
    use proptest::prelude::*;

    fn local_event(
        title: &str,
        date: NaiveDate,
        start_time: Option<&str>,
        end_time: Option<&str>,
        all_day: bool,
    ) -> RoomEvent {
        RoomEvent {
            id: "evt-1".to_string(),
            room_id: "room-1".to_string(),
            title: title.to_string(),
            date,
            start_time: start_time.map(String::from),
            end_time: end_time.map(String::from),
            description: None,
            all_day,
            participants: "[]".to_string(),
            source: "local".to_string(),
            remote_event_id: None,
            remote_calendar_id: None,
            synced_at: None,
            created_by: "user-1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_all_day_maps_to_exclusive_date_range() {
        let event = local_event(
            "Dentist",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            None,
            None,
            true,
        );

        let remote = to_remote(&event, New_York, &HashMap::new()).unwrap();
        assert_eq!(remote.start.date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(remote.end.date, NaiveDate::from_ymd_opt(2025, 3, 11));
        assert!(remote.start.date_time.is_none());
        assert_eq!(remote.summary.as_deref(), Some("Dentist"));
    }

    #[test]
    fn test_timed_event_maps_to_qualified_instants() {
        let event = local_event(
            "Soccer practice",
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            Some("16:00"),
            Some("17:30"),
            false,
        );

        let remote = to_remote(&event, New_York, &HashMap::new()).unwrap();
        let start = remote.start.date_time.unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-12T16:00:00-04:00");
        assert_eq!(remote.start.time_zone.as_deref(), Some("America/New_York"));
        assert_eq!(remote.end.date_time.unwrap().to_rfc3339(), "2025-03-12T17:30:00-04:00");
    }

    #[test]
    fn test_timed_event_missing_end_is_invalid() {
        let event = local_event(
            "Broken",
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            Some("16:00"),
            None,
            false,
        );
        assert!(to_remote(&event, New_York, &HashMap::new()).is_err());
    }

    #[test]
    fn test_participants_resolve_through_directory() {
        let mut event = local_event(
            "Family dinner",
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            None,
            None,
            true,
        );
        event.participants = r#"["m1","m2","ghost"]"#.to_string();

        let directory: HashMap<String, String> = [
            ("m1".to_string(), "alice@example.com".to_string()),
            ("m2".to_string(), "bob@example.com".to_string()),
        ]
        .into();

        let remote = to_remote(&event, New_York, &directory).unwrap();
        let emails: Vec<&str> = remote.attendees.iter().map(|a| a.email.as_str()).collect();
        // Unresolvable ids are omitted, never a failure
        assert_eq!(emails, vec!["alice@example.com", "bob@example.com"]);
    }

    #[test]
    fn test_date_only_remote_becomes_all_day() {
        let remote = RemoteEvent {
            id: "g1".to_string(),
            summary: Some("Holiday".to_string()),
            start: RemoteEventTime::all_day(NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()),
            end: RemoteEventTime::all_day(NaiveDate::from_ymd_opt(2025, 7, 5).unwrap()),
            ..Default::default()
        };

        let fields = to_local(&remote, New_York).unwrap();
        assert!(fields.all_day);
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        assert_eq!(fields.start_time, None);
        assert_eq!(fields.end_time, None);
    }

    #[test]
    fn test_timed_remote_populates_both_times() {
        let remote = RemoteEvent {
            id: "g123".to_string(),
            summary: Some("Soccer practice".to_string()),
            start: RemoteEventTime {
                date_time: Some("2025-03-12T16:00:00-04:00".parse().unwrap()),
                date: None,
                time_zone: Some("America/New_York".to_string()),
            },
            end: RemoteEventTime {
                date_time: Some("2025-03-12T17:30:00-04:00".parse().unwrap()),
                date: None,
                time_zone: Some("America/New_York".to_string()),
            },
            ..Default::default()
        };

        let fields = to_local(&remote, New_York).unwrap();
        assert!(!fields.all_day);
        assert_eq!(fields.start_time.as_deref(), Some("16:00"));
        assert_eq!(fields.end_time.as_deref(), Some("17:30"));
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
    }

    #[test]
    fn test_missing_title_maps_to_placeholder() {
        let remote = RemoteEvent {
            id: "g2".to_string(),
            summary: None,
            start: RemoteEventTime::all_day(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            end: RemoteEventTime::all_day(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
            ..Default::default()
        };
        assert_eq!(to_local(&remote, New_York).unwrap().title, UNTITLED);

        let blank = RemoteEvent { summary: Some(String::new()), ..remote };
        assert_eq!(to_local(&blank, New_York).unwrap().title, UNTITLED);
    }

    proptest! {
        // Round-trip: to_local(to_remote(e)) reproduces date, times, all_day
        // and title for whole-minute events. Runs in a DST-free zone so no
        // generated wall-clock time lands in a spring-forward gap.
        #[test]
        fn prop_round_trip_preserves_event_fields(
            title in "[A-Za-z][A-Za-z0-9 ]{0,30}",
            year in 2024i32..2028,
            month in 1u32..=12,
            day in 1u32..=28,
            start_minute_of_day in 0u32..(22 * 60),
            duration_minutes in 1u32..=90,
            all_day in any::<bool>(),
        ) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            let (start_time, end_time) = if all_day {
                (None, None)
            } else {
                let end_minute = start_minute_of_day + duration_minutes;
                (
                    Some(format!("{:02}:{:02}", start_minute_of_day / 60, start_minute_of_day % 60)),
                    Some(format!("{:02}:{:02}", end_minute / 60, end_minute % 60)),
                )
            };

            let event = local_event(
                &title,
                date,
                start_time.as_deref(),
                end_time.as_deref(),
                all_day,
            );

            let remote = to_remote(&event, Phoenix, &HashMap::new()).unwrap();
            let fields = to_local(&remote, Phoenix).unwrap();

            prop_assert_eq!(fields.title, title);
            prop_assert_eq!(fields.date, date);
            prop_assert_eq!(fields.start_time, start_time);
            prop_assert_eq!(fields.end_time, end_time);
            prop_assert_eq!(fields.all_day, all_day);
        }
    }
}
