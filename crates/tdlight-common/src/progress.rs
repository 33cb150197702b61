//! Server-push progress events and the per-job view built from them.
//!
//! All three job categories share one event payload. Which fields are
//! populated depends on the job: classification reports `step`, imports
//! report `stats` and a terminal `log`, auto-classification reports batch
//! counters.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Job categories ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Classify,
    Import,
    AutoClassify,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Classify, JobKind::Import, JobKind::AutoClassify];

    /// Human-readable stage names, indexed by [`JobProgress::stage`].
    pub fn stage_labels(self) -> &'static [&'static str] {
        match self {
            JobKind::Classify     => &["Extracting", "Features", "Predicting", "Results"],
            JobKind::Import       => &["Creating tables", "Importing", "Done"],
            JobKind::AutoClassify => &[],
        }
    }

    /// Terminal outcome carried by `event`, if any.
    pub fn outcome(self, event: &ProgressEvent) -> Option<JobOutcome> {
        match event.status {
            Some(JobStatus::Completed) => return Some(JobOutcome::Completed),
            Some(JobStatus::Stopped)   => return Some(JobOutcome::Stopped),
            Some(JobStatus::Paused)    => return Some(JobOutcome::Paused),
            Some(JobStatus::Error)     => {
                return Some(JobOutcome::Failed(event.message.clone().unwrap_or_default()))
            }
            _ => {}
        }
        if event.percent >= 100.0 {
            return Some(JobOutcome::Completed);
        }
        if self == JobKind::Classify && (event.step.as_deref() == Some("done") || event.mentions_done()) {
            return Some(JobOutcome::Completed);
        }
        None
    }

    /// Stage index implied by `event`, if this job kind tracks stages.
    pub fn stage(self, event: &ProgressEvent) -> Option<usize> {
        match self {
            JobKind::Classify => {
                let step = event.step.as_deref();
                Some(if step == Some("extract") || event.percent < 33.0 {
                    0
                } else if step == Some("feature") || event.percent < 66.0 {
                    1
                } else {
                    2
                })
            }
            JobKind::Import => {
                let message = event.message.as_deref().unwrap_or_default();
                Some(if message.contains("建表") || message.contains("Creating tables") {
                    0
                } else if event.status == Some(JobStatus::Completed) || event.percent >= 100.0 {
                    2
                } else {
                    1
                })
            }
            JobKind::AutoClassify => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobKind::Classify     => "classification",
            JobKind::Import       => "import",
            JobKind::AutoClassify => "auto-classification",
        })
    }
}

/// How a job ended, as reported by its final event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Stopped,
    Paused,
    Failed(String),
}

// ── Wire payload ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Stopped,
    Paused,
    Error,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "idle"      => JobStatus::Idle,
            "running"   => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "stopped"   => JobStatus::Stopped,
            "paused"    => JobStatus::Paused,
            "error"     => JobStatus::Error,
            _           => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Idle      => "idle".into(),
            JobStatus::Running   => "running".into(),
            JobStatus::Completed => "completed".into(),
            JobStatus::Stopped   => "stopped".into(),
            JobStatus::Paused    => "paused".into(),
            JobStatus::Error     => "error".into(),
            JobStatus::Other(s)  => s,
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from(self.clone()))
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(JobStatus::from)
    }
}

/// Import counters as written by the ingestion tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    #[serde(default)]
    pub processed_files: u64,
    #[serde(default)]
    pub inserted_records: u64,
    #[serde(default)]
    pub created_tables: u64,
    #[serde(default, deserialize_with = "crate::entities::opt_string_or_number")]
    pub elapsed_time: Option<String>,
}

/// One `data:` payload from any of the three progress streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ImportStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_batch: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_batches: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
}

impl ProgressEvent {
    pub fn new(percent: f64, message: impl Into<String>) -> Self {
        Self {
            percent,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Placeholder events sent while no job is running.
    pub fn is_idle(&self) -> bool {
        self.status == Some(JobStatus::Idle)
    }

    fn mentions_done(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.contains("完成") || m.contains("Done"))
    }

    fn batch(&self) -> Option<BatchProgress> {
        let current_batch = self.current_batch.filter(|&b| b > 0)?;
        Some(BatchProgress {
            current_batch,
            total_batches:  self.total_batches.unwrap_or_default(),
            batch_progress: self.batch_progress.unwrap_or_default(),
            processed:      self.processed.unwrap_or_default(),
            batch_total:    self.batch_total.unwrap_or_default(),
            updated:        self.updated.unwrap_or_default(),
        })
    }
}

/// Keep only what a terminal would show: on each line, the text after the
/// last carriage return.
pub fn clean_terminal_log(raw: &str) -> String {
    raw.split('\n')
        .map(|line| line.rsplit('\r').next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Accumulated view ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchProgress {
    pub current_batch: u64,
    pub total_batches: u64,
    pub batch_progress: f64,
    pub processed: u64,
    pub batch_total: u64,
    pub updated: u64,
}

/// Latest known state of one job, folded from its event stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobProgress {
    pub percent: f64,
    pub message: String,
    pub step: Option<String>,
    pub status: Option<JobStatus>,
    pub stage: Option<usize>,
    pub stats: Option<ImportStats>,
    pub batch: Option<BatchProgress>,
    pub log: Option<String>,
    pub events_applied: u64,
}

impl JobProgress {
    /// Fold one event in. Fields absent from the event keep their value.
    /// Idle placeholders are ignored; returns whether anything changed.
    pub fn apply(&mut self, kind: JobKind, event: &ProgressEvent) -> bool {
        if event.is_idle() {
            return false;
        }
        // Classification emits zero-percent "waiting" heartbeats that
        // carry no progress information.
        if kind == JobKind::Classify && event.percent <= 0.0 && kind.outcome(event).is_none() {
            return false;
        }

        self.percent = event.percent;
        if let Some(message) = &event.message {
            self.message.clone_from(message);
        }
        if event.step.is_some() {
            self.step.clone_from(&event.step);
        }
        if event.status.is_some() {
            self.status.clone_from(&event.status);
        }
        if let Some(stage) = kind.stage(event) {
            self.stage = Some(stage);
        }
        if event.stats.is_some() {
            self.stats.clone_from(&event.stats);
        }
        if let Some(batch) = event.batch() {
            self.batch = Some(batch);
        }
        if let Some(log) = &event.log {
            self.log = Some(clean_terminal_log(log));
        }
        self.events_applied += 1;
        true
    }

    pub fn stage_label(&self, kind: JobKind) -> Option<&'static str> {
        self.stage.and_then(|i| kind.stage_labels().get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(json: &str) -> ProgressEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn idle_events_do_not_touch_progress() {
        let mut progress = JobProgress::default();
        progress.apply(JobKind::Import, &event(r#"{"percent":40,"message":"Importing","status":"running"}"#));
        let before = progress.clone();

        let changed = progress.apply(JobKind::Import, &event(r#"{"percent":0,"message":"No task","status":"idle"}"#));

        assert!(!changed);
        assert_eq!(progress, before);
    }

    #[test]
    fn absent_fields_keep_previous_values() {
        let mut progress = JobProgress::default();
        progress.apply(
            JobKind::Import,
            &event(r#"{"percent":10,"message":"a","status":"running","stats":{"processed_files":3,"inserted_records":900,"created_tables":2,"elapsed_time":"4s"}}"#),
        );
        progress.apply(JobKind::Import, &event(r#"{"percent":20,"message":"b"}"#));

        assert_eq!(progress.percent, 20.0);
        assert_eq!(progress.message, "b");
        assert_eq!(progress.status, Some(JobStatus::Running));
        assert_eq!(progress.stats.as_ref().map(|s| s.inserted_records), Some(900));
    }

    #[test]
    fn classification_terminal_rules() {
        let k = JobKind::Classify;
        assert_eq!(k.outcome(&ProgressEvent::new(100.0, "x")), Some(JobOutcome::Completed));
        assert_eq!(k.outcome(&ProgressEvent::new(90.0, "x").with_step("done")), Some(JobOutcome::Completed));
        assert_eq!(k.outcome(&ProgressEvent::new(90.0, "分类完成")), Some(JobOutcome::Completed));
        assert_eq!(k.outcome(&ProgressEvent::new(95.0, "Done: 12 objects")), Some(JobOutcome::Completed));
        assert_eq!(k.outcome(&ProgressEvent::new(50.0, "Predicting")), None);
    }

    #[test]
    fn done_message_is_only_terminal_for_classification() {
        let ev = ProgressEvent::new(50.0, "Done with file 3");
        assert_eq!(JobKind::Import.outcome(&ev), None);
    }

    #[test]
    fn status_outcomes() {
        let stopped = ProgressEvent::new(0.0, "Manually stopped").with_status(JobStatus::Stopped);
        assert_eq!(JobKind::Import.outcome(&stopped), Some(JobOutcome::Stopped));

        let failed = ProgressEvent::new(12.0, "model missing").with_status(JobStatus::Error);
        assert_eq!(
            JobKind::AutoClassify.outcome(&failed),
            Some(JobOutcome::Failed("model missing".into()))
        );

        let paused = ProgressEvent::new(40.0, "paused").with_status(JobStatus::Paused);
        assert_eq!(JobKind::AutoClassify.outcome(&paused), Some(JobOutcome::Paused));
    }

    #[test]
    fn classification_stages() {
        let k = JobKind::Classify;
        assert_eq!(k.stage(&ProgressEvent::new(10.0, "")), Some(0));
        assert_eq!(k.stage(&ProgressEvent::new(50.0, "").with_step("extract")), Some(0));
        assert_eq!(k.stage(&ProgressEvent::new(40.0, "")), Some(1));
        assert_eq!(k.stage(&ProgressEvent::new(70.0, "").with_step("feature")), Some(1));
        assert_eq!(k.stage(&ProgressEvent::new(70.0, "").with_step("predict")), Some(2));
    }

    #[test]
    fn import_stages() {
        let k = JobKind::Import;
        assert_eq!(k.stage(&ProgressEvent::new(5.0, "Creating tables (3/10)")), Some(0));
        assert_eq!(k.stage(&ProgressEvent::new(5.0, "正在建表")), Some(0));
        assert_eq!(k.stage(&ProgressEvent::new(50.0, "Importing")), Some(1));
        assert_eq!(
            k.stage(&ProgressEvent::new(80.0, "ok").with_status(JobStatus::Completed)),
            Some(2)
        );
    }

    #[test]
    fn classification_waiting_heartbeat_is_skipped() {
        let mut progress = JobProgress::default();
        progress.apply(JobKind::Classify, &ProgressEvent::new(45.0, "Extracting"));
        let changed = progress.apply(JobKind::Classify, &ProgressEvent::new(0.0, "Waiting..."));
        assert!(!changed);
        assert_eq!(progress.percent, 45.0);
    }

    #[test]
    fn batch_counters_require_a_current_batch() {
        let mut progress = JobProgress::default();
        progress.apply(JobKind::AutoClassify, &event(r#"{"status":"running","percent":1,"message":"Starting"}"#));
        assert_eq!(progress.batch, None);

        progress.apply(
            JobKind::AutoClassify,
            &event(r#"{"status":"running","percent":30,"message":"b","current_batch":2,"total_batches":5,"batch_progress":50,"processed":2500,"batch_total":5000,"updated":2400}"#),
        );
        let batch = progress.batch.unwrap();
        assert_eq!(batch.current_batch, 2);
        assert_eq!(batch.total_batches, 5);
        assert_eq!(batch.updated, 2400);
    }

    #[test]
    fn terminal_log_keeps_text_after_last_carriage_return() {
        let raw = "start\nfile 1: 10%\rfile 1: 50%\rfile 1: 100%\ndone";
        assert_eq!(clean_terminal_log(raw), "start\nfile 1: 100%\ndone");
    }

    #[test]
    fn unknown_status_is_preserved() {
        let ev = event(r#"{"status":"warming_up","percent":3}"#);
        assert_eq!(ev.status, Some(JobStatus::Other("warming_up".into())));
        assert!(!ev.is_idle());
    }
}
