// file: src/provider/google.rs
// Google Calendar REST client
// Stateless: tokens come from the caller, failures normalize to ProviderError

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{CalendarApi, RemoteCalendar, RemoteEvent};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, SyncError, SyncResult};
use crate::http_config::HttpConfig;

const MAX_RESULTS_PER_PAGE: u32 = 250;

pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<RemoteEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CalendarListPage {
    #[serde(default)]
    items: Vec<RemoteCalendar>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

impl GoogleCalendarClient {
    pub fn new(config: &ProviderConfig) -> SyncResult<Self> {
        let http = HttpConfig::calendar_api()
            .build_client()
            .map_err(|e| SyncError::config(format!("Failed to build calendar client: {}", e)))?;
        Ok(Self { http, base_url: config.api_base_url.trim_end_matches('/').to_string() })
    }

    async fn check(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(normalize_status(status, body))
    }
}

fn normalize_status(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 => ProviderError::Unauthorized,
        404 | 410 => ProviderError::NotFound(body),
        429 => ProviderError::RateLimited,
        s if (500..600).contains(&s) => {
            ProviderError::RemoteServerError { status: s, message: body }
        }
        s => ProviderError::RemoteClientError { status: s, message: body },
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_calendars(&self, token: &str) -> Result<Vec<RemoteCalendar>, ProviderError> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/users/me/calendarList", self.base_url))
                .bearer_auth(token);
            if let Some(ref cursor) = page_token {
                request = request.query(&[("pageToken", cursor.as_str())]);
            }

            let response = Self::check(request.send().await?).await?;
            let page: CalendarListPage = response
                .json()
                .await
                .map_err(|e| ProviderError::Network(format!("malformed calendar list: {}", e)))?;

            calendars.extend(page.items);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(calendars)
    }

    async fn list_events(
        &self,
        token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>, ProviderError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/calendars/{}/events", self.base_url, calendar_id))
                .bearer_auth(token)
                .query(&[
                    ("singleEvents", "true".to_string()),
                    ("orderBy", "startTime".to_string()),
                    ("timeMin", time_min.to_rfc3339()),
                    ("timeMax", time_max.to_rfc3339()),
                    ("maxResults", MAX_RESULTS_PER_PAGE.to_string()),
                ]);
            if let Some(ref cursor) = page_token {
                request = request.query(&[("pageToken", cursor.as_str())]);
            }

            let response = Self::check(request.send().await?).await?;
            let page: EventsPage = response
                .json()
                .await
                .map_err(|e| ProviderError::Network(format!("malformed events page: {}", e)))?;

            // Cancelled events never surface to callers.
            events.extend(page.items.into_iter().filter(|e| !e.is_cancelled()));

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} events from calendar {}", events.len(), calendar_id);
        Ok(events)
    }

    async fn create_event(
        &self,
        token: &str,
        calendar_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, ProviderError> {
        let response = self
            .http
            .post(format!("{}/calendars/{}/events", self.base_url, calendar_id))
            .bearer_auth(token)
            .json(event)
            .send()
            .await?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("malformed created event: {}", e)))
    }

    async fn update_event(
        &self,
        token: &str,
        calendar_id: &str,
        remote_event_id: &str,
        event: &RemoteEvent,
    ) -> Result<RemoteEvent, ProviderError> {
        let response = self
            .http
            .put(format!(
                "{}/calendars/{}/events/{}",
                self.base_url, calendar_id, remote_event_id
            ))
            .bearer_auth(token)
            .json(event)
            .send()
            .await?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Network(format!("malformed updated event: {}", e)))
    }

    async fn delete_event(
        &self,
        token: &str,
        calendar_id: &str,
        remote_event_id: &str,
    ) -> Result<(), ProviderError> {
        let response = self
            .http
            .delete(format!(
                "{}/calendars/{}/events/{}",
                self.base_url, calendar_id, remote_event_id
            ))
            .bearer_auth(token)
            .send()
            .await?;

        match Self::check(response).await {
            Ok(_) => Ok(()),
            // Already gone upstream: the desired end state holds.
            Err(ProviderError::NotFound(_)) => {
                debug!("Event {} already deleted remotely", remote_event_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status_taxonomy() {
        assert!(matches!(
            normalize_status(StatusCode::UNAUTHORIZED, String::new()),
            ProviderError::Unauthorized
        ));
        assert!(matches!(
            normalize_status(StatusCode::NOT_FOUND, String::new()),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            normalize_status(StatusCode::GONE, String::new()),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            normalize_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            normalize_status(StatusCode::BAD_GATEWAY, String::new()),
            ProviderError::RemoteServerError { status: 502, .. }
        ));
        assert!(matches!(
            normalize_status(StatusCode::FORBIDDEN, String::new()),
            ProviderError::RemoteClientError { status: 403, .. }
        ));
    }
}
