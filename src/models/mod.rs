// Declare modules
pub mod credential;
pub mod event;
pub mod sync;

// Re-export main types
pub use credential::CredentialRecord;
pub use event::{EventPatch, EventSource, Field, RoomEvent};
pub use sync::{ExportReport, SyncSummary};
