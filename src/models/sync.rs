// file: src/models/sync.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one import run for a (user, room) pair.
///
/// Counts are aggregated across all selected calendars; a failing calendar
/// contributes an error string without suppressing siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub imported: usize,
    pub updated: usize,
    pub removed: usize,
    pub errors: Vec<String>,
    pub sync_time: DateTime<Utc>,
}

impl SyncSummary {
    pub fn new() -> Self {
        Self {
            imported: 0,
            updated: 0,
            removed: 0,
            errors: Vec::new(),
            sync_time: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn record_error(&mut self, calendar_id: &str, error: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", calendar_id, error));
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a batch export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub exported: usize,
    pub updated: usize,
    pub errors: Vec<String>,
    pub export_time: DateTime<Utc>,
}

impl ExportReport {
    pub fn new() -> Self {
        Self {
            exported: 0,
            updated: 0,
            errors: Vec::new(),
            export_time: Utc::now(),
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Default for ExportReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_success_only_without_errors() {
        let mut summary = SyncSummary::new();
        assert!(summary.success());

        summary.imported = 3;
        summary.record_error("primary", "rate limited");
        assert!(!summary.success());
        assert_eq!(summary.errors, vec!["primary: rate limited".to_string()]);
    }

    #[test]
    fn test_export_report_default_is_empty() {
        let report = ExportReport::default();
        assert!(report.success());
        assert_eq!(report.exported, 0);
        assert_eq!(report.updated, 0);
    }
}
