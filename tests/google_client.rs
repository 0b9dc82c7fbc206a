// Wire-level tests for the Google client: pagination, cancelled-event
// filtering, delete tolerance, and error normalization against a mock
// HTTP server.

use chrono::{Duration, Utc};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roomsync::provider::GoogleCalendarClient;
use roomsync::{CalendarApi, ProviderConfig, ProviderError};

fn client_for(server: &MockServer) -> GoogleCalendarClient {
    let mut config = ProviderConfig::new(
        "client-id".to_string(),
        "client-secret".to_string(),
        "http://localhost:3000/api/google/callback".to_string(),
    );
    config.api_base_url = server.uri();
    GoogleCalendarClient::new(&config).unwrap()
}

fn window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let now = Utc::now();
    (now - Duration::days(90), now + Duration::days(365))
}

#[tokio::test]
async fn test_list_events_follows_pagination_and_drops_cancelled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "g1",
                    "summary": "Kept",
                    "start": {"date": "2025-06-01"},
                    "end": {"date": "2025-06-02"}
                },
                {
                    "id": "g2",
                    "summary": "Cancelled upstream",
                    "status": "cancelled",
                    "start": {"date": "2025-06-03"},
                    "end": {"date": "2025-06-04"}
                }
            ],
            "nextPageToken": "cursor-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("pageToken", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "g3",
                    "summary": "Second page",
                    "start": {"date": "2025-06-05"},
                    "end": {"date": "2025-06-06"}
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (time_min, time_max) = window();
    let events = client.list_events("token", "primary", time_min, time_max).await.unwrap();

    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g3"]);
}

#[tokio::test]
async fn test_list_events_sends_window_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/family123/events"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(wiremock::matchers::header("authorization", "Bearer token-abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (time_min, time_max) = window();
    let events = client
        .list_events("token-abc", "family123", time_min, time_max)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_list_calendars_maps_summary_to_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {"id": "primary", "summary": "My calendar", "primary": true},
                {"id": "family123", "summary": "Family"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let calendars = client.list_calendars("token").await.unwrap();
    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].name, "My calendar");
    assert!(calendars[0].primary);
    assert!(!calendars[1].primary);
}

#[tokio::test]
async fn test_delete_event_treats_already_gone_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/g404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete_event("token", "primary", "g404").await.unwrap();
}

#[tokio::test]
async fn test_create_event_returns_assigned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "assigned-1",
            "summary": "Dentist",
            "start": {"date": "2025-03-10"},
            "end": {"date": "2025-03-11"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payload = roomsync::RemoteEvent {
        summary: Some("Dentist".to_string()),
        start: roomsync::provider::RemoteEventTime::all_day(
            chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        ),
        end: roomsync::provider::RemoteEventTime::all_day(
            chrono::NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
        ),
        ..Default::default()
    };

    let created = client.create_event("token", "primary", &payload).await.unwrap();
    assert_eq!(created.id, "assigned-1");
}

#[tokio::test]
async fn test_provider_failures_normalize() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/denied/events"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/throttled/events"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (time_min, time_max) = window();

    let err = client.list_events("token", "denied", time_min, time_max).await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized));

    let err = client.list_events("token", "throttled", time_min, time_max).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited));
    assert!(err.is_transient());
}
