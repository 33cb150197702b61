//! User-facing notifications.
//!
//! Every message the portal can show is a [`NoticeKind`] variant; its
//! `Display` impl is the message catalog, so a missing or misspelled key is
//! a compile error rather than a blank toast.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    // Configuration
    ConfigLoaded,
    ConfigLoadFailed(String),
    ConfigSaved,
    ConfigSaveFailed(String),
    ConfigSynced { db_name: String },
    ConfigSyncFailed(String),
    ConfigApplied,
    ConfigApplyFailed(String),

    // Databases
    DatabasesRefreshed { count: usize },
    NoUserDatabases,
    DatabaseListFailed(String),
    NoDatabaseChosen,
    DatabaseDropped { name: String },
    DatabaseDropFailed(String),

    // Search and viewing
    InvalidSearchInput(String),
    NoIdsEntered,
    ObjectsFound { count: usize },
    ObjectsAppended { count: usize },
    AllAlreadyListed,
    NothingFound,
    ListCleared,
    SearchFailed(String),
    ObjectUnavailable,
    NoLightCurve,
    LightCurveFailed(String),

    // Classification
    NothingSelected,
    ClassificationFailed(String),
    ClassificationFinished { count: usize },
    NoClassificationResults,
    ClassificationStopped,

    // Import
    ImportInputMissing(String),
    ImportStarted,
    ImportFailed(String),
    ImportError(String),
    ImportCompleted,
    ImportStopped,
    PendingDetected { count: u64 },

    // Auto-classification
    PendingCheckFailed(String),
    AutoClassifyStarted { count: u64 },
    AutoClassifyFailed(String),
    AutoClassifyCompleted,
    AutoClassifyPaused,
    AutoClassifyError(String),
    AutoClassifyStopped,

    // Jobs in general
    StopFailed(String),

    // Export
    ExportEmpty,
    ExportNoLightCurve,
    ExportWritten { path: String, rows: usize },
    ExportFailed(String),
}

impl NoticeKind {
    pub fn level(&self) -> NoticeLevel {
        use NoticeKind::*;
        match self {
            ConfigLoaded
            | ConfigSaved
            | ConfigSynced { .. }
            | ConfigApplied
            | DatabasesRefreshed { .. }
            | DatabaseDropped { .. }
            | ObjectsFound { .. }
            | ObjectsAppended { .. }
            | ListCleared
            | ClassificationFinished { .. }
            | ClassificationStopped
            | ImportStarted
            | ImportCompleted
            | PendingDetected { .. }
            | AutoClassifyStarted { .. }
            | AutoClassifyCompleted
            | AutoClassifyPaused
            | AutoClassifyStopped
            | ExportWritten { .. } => NoticeLevel::Success,

            AllAlreadyListed | NoClassificationResults => NoticeLevel::Info,

            NoUserDatabases | NoDatabaseChosen | ImportStopped => NoticeLevel::Warning,

            ConfigLoadFailed(_)
            | ConfigSaveFailed(_)
            | ConfigSyncFailed(_)
            | ConfigApplyFailed(_)
            | DatabaseListFailed(_)
            | DatabaseDropFailed(_)
            | InvalidSearchInput(_)
            | NoIdsEntered
            | NothingFound
            | SearchFailed(_)
            | ObjectUnavailable
            | NoLightCurve
            | LightCurveFailed(_)
            | NothingSelected
            | ClassificationFailed(_)
            | ImportInputMissing(_)
            | ImportFailed(_)
            | ImportError(_)
            | PendingCheckFailed(_)
            | AutoClassifyFailed(_)
            | AutoClassifyError(_)
            | StopFailed(_)
            | ExportEmpty
            | ExportNoLightCurve
            | ExportFailed(_) => NoticeLevel::Error,
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NoticeKind::*;
        match self {
            ConfigLoaded                    => write!(f, "Configuration loaded"),
            ConfigLoadFailed(e)             => write!(f, "Failed to load configuration: {}", e),
            ConfigSaved                     => write!(f, "Configuration saved. Restart or reload the backend to apply it."),
            ConfigSaveFailed(e)             => write!(f, "Failed to save configuration: {}", e),
            ConfigSynced { db_name }        => write!(f, "Configuration synced: {}", db_name),
            ConfigSyncFailed(e)             => write!(f, "Failed to sync configuration: {}", e),
            ConfigApplied                   => write!(f, "Configuration saved and applied to the backend"),
            ConfigApplyFailed(e)            => write!(f, "Failed to apply configuration: {}", e),

            DatabasesRefreshed { count }    => write!(f, "Refreshed: {} user databases", count),
            NoUserDatabases                 => write!(f, "No user databases"),
            DatabaseListFailed(e)           => write!(f, "Failed to list databases: {}", e),
            NoDatabaseChosen                => write!(f, "Choose a database to drop first"),
            DatabaseDropped { name }        => write!(f, "Database {} dropped", name),
            DatabaseDropFailed(e)           => write!(f, "Failed to drop database: {}", e),

            InvalidSearchInput(e)           => write!(f, "Invalid search input: {}", e),
            NoIdsEntered                    => write!(f, "Enter at least one source ID"),
            ObjectsFound { count }          => write!(f, "Found {} objects", count),
            ObjectsAppended { count }       => write!(f, "Appended {} objects", count),
            AllAlreadyListed                => write!(f, "All objects are already in the list"),
            NothingFound                    => write!(f, "No objects found"),
            ListCleared                     => write!(f, "Object list cleared"),
            SearchFailed(e)                 => write!(f, "Search failed: {}", e),
            ObjectUnavailable               => write!(f, "Object information not found"),
            NoLightCurve                    => write!(f, "No light-curve data found"),
            LightCurveFailed(e)             => write!(f, "Failed to load light curve: {}", e),

            NothingSelected                 => write!(f, "Select objects to classify first"),
            ClassificationFailed(e)         => write!(f, "Classification failed: {}", e),
            ClassificationFinished { count } => write!(f, "Classified {} objects", count),
            NoClassificationResults         => write!(f, "Classification finished without results"),
            ClassificationStopped           => write!(f, "Classification stopped"),

            ImportInputMissing(e)           => write!(f, "{}", e),
            ImportStarted                   => write!(f, "Import task started"),
            ImportFailed(e)                 => write!(f, "Failed to start import: {}", e),
            ImportError(e)                  => write!(f, "Import error: {}", e),
            ImportCompleted                 => write!(f, "Import complete!"),
            ImportStopped                   => write!(f, "Import stopped"),
            PendingDetected { count }       => write!(f, "{} objects are waiting for classification; start auto-classification to process them", count),

            PendingCheckFailed(e)           => write!(f, "Pending check failed: {}", e),
            AutoClassifyStarted { count }   => write!(f, "Auto-classification started for {} objects", count),
            AutoClassifyFailed(e)           => write!(f, "Failed to start auto-classification: {}", e),
            AutoClassifyCompleted           => write!(f, "Auto-classification complete!"),
            AutoClassifyPaused              => write!(f, "Auto-classification paused; resume to continue"),
            AutoClassifyError(e)            => write!(f, "Auto-classification error: {}", e),
            AutoClassifyStopped             => write!(f, "Auto-classification stopped"),

            StopFailed(e)                   => write!(f, "Stop failed: {}", e),

            ExportEmpty                     => write!(f, "No objects to export"),
            ExportNoLightCurve              => write!(f, "No light-curve data"),
            ExportWritten { path, rows }    => write!(f, "Exported {} rows to {}", rows, path),
            ExportFailed(e)                 => write!(f, "Export failed: {}", e),
        }
    }
}

/// One emitted notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    #[serde(serialize_with = "serialize_display")]
    pub kind: NoticeKind,
    pub level: NoticeLevel,
    pub at: DateTime<Utc>,
}

fn serialize_display<S: serde::Serializer>(kind: &NoticeKind, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(kind)
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            level: kind.level(),
            kind,
            at: Utc::now(),
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_errors() {
        assert_eq!(NoticeKind::ConfigLoadFailed("x".into()).level(), NoticeLevel::Error);
        assert_eq!(NoticeKind::ExportEmpty.level(), NoticeLevel::Error);
        assert_eq!(NoticeKind::ImportStopped.level(), NoticeLevel::Warning);
        assert_eq!(NoticeKind::ObjectsFound { count: 3 }.level(), NoticeLevel::Success);
    }

    #[test]
    fn messages_carry_details() {
        let notice = Notice::new(NoticeKind::AutoClassifyError("model not loaded".into()));
        assert_eq!(notice.message(), "Auto-classification error: model not loaded");
        assert_eq!(notice.level, NoticeLevel::Error);
    }
}
