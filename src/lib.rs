// roomsync - external calendar synchronization engine
// Keeps a room's event collection consistent with a user's Google Calendar:
// OAuth connection lifecycle, windowed import with mirror reconciliation,
// and export of locally authored events.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod http_config;
pub mod models;
pub mod provider;
pub mod sync;
pub mod translate;
pub mod utils;

pub use auth::{authorization_url, decode_state, encode_state, StatePayload, TokenManager};
pub use config::ProviderConfig;
pub use database::Database;
pub use error::{ProviderError, SyncError, SyncResult};
pub use models::{
    CredentialRecord, EventPatch, EventSource, ExportReport, Field, RoomEvent, SyncSummary,
};
pub use provider::{CalendarApi, GoogleCalendarClient, RemoteCalendar, RemoteEvent};
pub use sync::{ReconciliationEngine, SyncGuard};
pub use translate::{to_local, to_remote, LocalEventFields};
