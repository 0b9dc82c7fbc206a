// file: src/sync/mod.rs
// Reconciliation engine: imports remote events into room mirror records and
// exports locally authored events outward, through the token manager and
// the provider client.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use uuid::Uuid;

use crate::auth::TokenManager;
use crate::database::Database;
use crate::error::{ProviderError, SyncError, SyncResult};
use crate::http_config::HttpConfig;
use crate::models::{EventPatch, EventSource, ExportReport, Field, RoomEvent, SyncSummary};
use crate::provider::CalendarApi;
use crate::translate::{self, LocalEventFields};
use crate::utils::logging::log_sync_result;
use crate::utils::rate_gate::RateGate;
use crate::utils::retry::{retry_provider_call, RetryConfig};

pub mod guard;

pub use guard::SyncGuard;

/// Months of history included in the reconciliation window.
const WINDOW_MONTHS_BACK: i32 = 3;
/// Months ahead; 13 gives twelve full future months from the current one.
const WINDOW_MONTHS_FORWARD: i32 = 13;

const EXPORT_CONCURRENCY: usize = 4;

enum Pushed {
    Created,
    Updated,
}

pub struct ReconciliationEngine {
    db: Database,
    tokens: TokenManager,
    client: Arc<dyn CalendarApi>,
    tz: Tz,
    retry: RetryConfig,
    rate_gate: RateGate,
    guard: SyncGuard,
}

impl ReconciliationEngine {
    pub fn new(db: Database, tokens: TokenManager, client: Arc<dyn CalendarApi>, tz: Tz) -> Self {
        Self {
            db,
            tokens,
            client,
            tz,
            retry: HttpConfig::calendar_api().to_retry_config(),
            rate_gate: RateGate::default(),
            guard: SyncGuard::new(),
        }
    }

    /// Import run for one (user, room) pair.
    ///
    /// Each selected calendar is reconciled independently; one calendar's
    /// failure is recorded in the summary and the rest still run. Auth
    /// failures are terminal for the whole call since no calendar can
    /// proceed without a usable token.
    pub async fn sync(&self, user_id: &str, room_id: &str) -> SyncResult<SyncSummary> {
        let _lock = self.guard.acquire(user_id, room_id).await;

        let mut token = self.tokens.get_valid_access_token(user_id).await?;
        let record = self
            .db
            .get_credentials(user_id)
            .await?
            .ok_or(SyncError::ReauthorizationRequired)?;

        let (time_min, time_max) = reconciliation_window(Utc::now().date_naive());
        let mut summary = SyncSummary::new();

        for calendar_id in record.calendar_ids() {
            if let Err(e) = self
                .sync_calendar(user_id, room_id, &calendar_id, &mut token, time_min, time_max, &mut summary)
                .await
            {
                if e.needs_reconnect() {
                    return Err(e);
                }
                summary.record_error(&calendar_id, e);
            }
        }

        log_sync_result(user_id, room_id, summary.imported, summary.updated, summary.removed);
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn sync_calendar(
        &self,
        user_id: &str,
        room_id: &str,
        calendar_id: &str,
        token: &mut String,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        summary: &mut SyncSummary,
    ) -> SyncResult<()> {
        let remote_events = self
            .provider_call(user_id, token, |t| {
                let client = self.client.clone();
                async move { client.list_events(&t, calendar_id, time_min, time_max).await }
            })
            .await?;

        let mirrors = self.db.get_mirror_events(room_id, calendar_id, user_id).await?;
        let mut unseen: HashMap<String, &RoomEvent> = mirrors
            .iter()
            .filter_map(|m| m.remote_event_id.as_ref().map(|rid| (rid.clone(), m)))
            .collect();

        let now = Utc::now();

        for remote in &remote_events {
            if remote.id.is_empty() {
                warn!("Skipping remote event without an id in calendar {}", calendar_id);
                continue;
            }

            let fields = match translate::to_local(remote, self.tz) {
                Ok(fields) => fields,
                Err(e) => {
                    summary.record_error(calendar_id, format!("event {}: {}", remote.id, e));
                    continue;
                }
            };

            match unseen.remove(&remote.id) {
                Some(mirror) => {
                    let changed = !mirror_matches(&fields, mirror);
                    let mut patch = EventPatch { synced_at: Field::Set(now), ..Default::default() };
                    if changed {
                        patch.title = Some(fields.title);
                        patch.date = Some(fields.date);
                        patch.start_time = Field::set(fields.start_time);
                        patch.end_time = Field::set(fields.end_time);
                        patch.description = Field::set(fields.description);
                        patch.all_day = Some(fields.all_day);
                    }
                    self.db.patch_event(&mirror.id, &patch).await?;
                    if changed {
                        summary.updated += 1;
                    }
                }
                None => {
                    let event = RoomEvent {
                        id: Uuid::new_v4().to_string(),
                        room_id: room_id.to_string(),
                        title: fields.title,
                        date: fields.date,
                        start_time: fields.start_time,
                        end_time: fields.end_time,
                        description: fields.description,
                        all_day: fields.all_day,
                        participants: "[]".to_string(),
                        source: EventSource::RemoteMirror.as_str().to_string(),
                        remote_event_id: Some(remote.id.clone()),
                        remote_calendar_id: Some(calendar_id.to_string()),
                        synced_at: Some(now),
                        created_by: user_id.to_string(),
                        created_at: now,
                        updated_at: now,
                    };
                    self.db.insert_event(&event).await?;
                    summary.imported += 1;
                }
            }
        }

        // Anything still unseen was removed upstream since the last run.
        for mirror in unseen.into_values() {
            self.db.delete_event(&mirror.id).await?;
            summary.removed += 1;
        }

        debug!(
            "Reconciled calendar {} for room {}: {} remote events, {} mirrors",
            calendar_id,
            room_id,
            remote_events.len(),
            mirrors.len()
        );
        Ok(())
    }

    /// Push one locally authored event outward: create and link on first
    /// export, update in place for an already linked event.
    pub async fn export_event(
        &self,
        user_id: &str,
        event_id: &str,
        calendar_id: &str,
        directory: &HashMap<String, String>,
    ) -> SyncResult<RoomEvent> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .ok_or_else(|| SyncError::not_found(format!("event {}", event_id)))?;
        if event.is_mirror() {
            return Err(SyncError::invalid_input(
                "mirrored events are not exported back to their origin",
            ));
        }

        let mut token = self.tokens.get_valid_access_token(user_id).await?;
        self.push_event(user_id, &mut token, &event, calendar_id, directory).await?;

        self.db
            .get_event(event_id)
            .await?
            .ok_or_else(|| SyncError::not_found(format!("event {}", event_id)))
    }

    /// Export every locally authored event in the room, linked or not, with
    /// bounded concurrency. One event's failure is recorded and the batch
    /// continues; auth failures stop the run.
    pub async fn export_all(
        &self,
        user_id: &str,
        room_id: &str,
        calendar_id: &str,
        directory: &HashMap<String, String>,
    ) -> SyncResult<ExportReport> {
        let token = self.tokens.get_valid_access_token(user_id).await?;
        let events = self.db.get_local_events(room_id, user_id).await?;
        let mut report = ExportReport::new();

        let outcomes: Vec<(RoomEvent, SyncResult<Pushed>)> = stream::iter(events)
            .map(|event| {
                let mut token = token.clone();
                async move {
                    let result = self
                        .push_event(user_id, &mut token, &event, calendar_id, directory)
                        .await;
                    (event, result)
                }
            })
            .buffer_unordered(EXPORT_CONCURRENCY)
            .collect()
            .await;

        for (event, result) in outcomes {
            match result {
                Ok(Pushed::Created) => report.exported += 1,
                Ok(Pushed::Updated) => report.updated += 1,
                Err(e) if e.needs_reconnect() => return Err(e),
                Err(e) => report.errors.push(format!("{}: {}", event.id, e)),
            }
        }

        Ok(report)
    }

    /// Delete the remote copy of a linked event and clear its link fields.
    /// The local event survives, unlinked. Tolerates the remote copy being
    /// gone already.
    pub async fn unlink_event(&self, user_id: &str, event_id: &str) -> SyncResult<()> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .ok_or_else(|| SyncError::not_found(format!("event {}", event_id)))?;
        if event.is_mirror() {
            return Err(SyncError::invalid_input("mirrored events cannot be unlinked"));
        }

        let (remote_id, remote_cal) = match (&event.remote_event_id, &event.remote_calendar_id) {
            (Some(id), Some(cal)) => (id.clone(), cal.clone()),
            _ => return Err(SyncError::invalid_input("event carries no remote link")),
        };

        let mut token = self.tokens.get_valid_access_token(user_id).await?;
        self.provider_call(user_id, &mut token, |t| {
            let client = self.client.clone();
            let remote_cal = remote_cal.clone();
            let remote_id = remote_id.clone();
            async move { client.delete_event(&t, &remote_cal, &remote_id).await }
        })
        .await?;

        self.db
            .patch_event(event_id, &EventPatch {
                remote_event_id: Field::Clear,
                remote_calendar_id: Field::Clear,
                synced_at: Field::Clear,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    async fn push_event(
        &self,
        user_id: &str,
        token: &mut String,
        event: &RoomEvent,
        calendar_id: &str,
        directory: &HashMap<String, String>,
    ) -> SyncResult<Pushed> {
        let payload = translate::to_remote(event, self.tz, directory)?;

        match (&event.remote_event_id, &event.remote_calendar_id) {
            (Some(remote_id), Some(remote_cal)) => {
                self.provider_call(user_id, token, |t| {
                    let client = self.client.clone();
                    let payload = payload.clone();
                    async move { client.update_event(&t, remote_cal, remote_id, &payload).await }
                })
                .await?;

                self.db
                    .patch_event(&event.id, &EventPatch {
                        synced_at: Field::Set(Utc::now()),
                        ..Default::default()
                    })
                    .await?;
                Ok(Pushed::Updated)
            }
            _ => {
                let created = self
                    .provider_call(user_id, token, |t| {
                        let client = self.client.clone();
                        let payload = payload.clone();
                        async move { client.create_event(&t, calendar_id, &payload).await }
                    })
                    .await?;

                self.db
                    .patch_event(&event.id, &EventPatch {
                        remote_event_id: Field::Set(created.id),
                        remote_calendar_id: Field::Set(calendar_id.to_string()),
                        synced_at: Field::Set(Utc::now()),
                        ..Default::default()
                    })
                    .await?;
                Ok(Pushed::Created)
            }
        }
    }

    /// Run a provider operation with transient-failure retry and at most one
    /// forced token refresh when the provider rejects the token. A second
    /// rejection escalates to a lost connection.
    async fn provider_call<T, F, Fut>(
        &self,
        user_id: &str,
        token: &mut String,
        op: F,
    ) -> SyncResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        self.rate_gate.wait_if_paused().await;

        let current = token.clone();
        match retry_provider_call(&self.retry, || op(current.clone())).await {
            Ok(value) => return Ok(value),
            Err(ProviderError::Unauthorized) => {
                debug!("Provider rejected token for user {}, forcing refresh", user_id);
            }
            Err(ProviderError::RateLimited) => {
                self.rate_gate.pause().await;
                return Err(ProviderError::RateLimited.into());
            }
            Err(e) => return Err(e.into()),
        }

        *token = self.tokens.force_refresh(user_id).await?;

        let refreshed = token.clone();
        match retry_provider_call(&self.retry, || op(refreshed.clone())).await {
            Ok(value) => Ok(value),
            Err(ProviderError::Unauthorized) => Err(SyncError::token_refresh_failed(
                "provider rejected a freshly refreshed access token",
            )),
            Err(ProviderError::RateLimited) => {
                self.rate_gate.pause().await;
                Err(ProviderError::RateLimited.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn mirror_matches(fields: &LocalEventFields, mirror: &RoomEvent) -> bool {
    mirror.title == fields.title
        && mirror.date == fields.date
        && mirror.start_time == fields.start_time
        && mirror.end_time == fields.end_time
        && mirror.description == fields.description
        && mirror.all_day == fields.all_day
}

/// Month-aligned window: first day of the month three months back, up to
/// but not including the first day of the month thirteen months ahead.
pub fn reconciliation_window(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = shift_month_start(today, -WINDOW_MONTHS_BACK);
    let end = shift_month_start(today, WINDOW_MONTHS_FORWARD);
    (
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&end.and_time(NaiveTime::MIN)),
    )
}

fn shift_month_start(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
