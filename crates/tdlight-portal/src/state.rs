//! Everything a portal session knows, owned by one [`Portal`](crate::Portal).

use std::collections::VecDeque;

use tdlight_common::{
    CelestialObject, ClassificationResult, JobKind, JobProgress, LightCurve, SourceId,
};

use crate::form::{ConfigForm, ImportForm};
use crate::notice::Notice;
use crate::selection::Selection;
use crate::skymap::ConeOverlay;

const NOTICE_HISTORY: usize = 50;

/// Light curves waiting for auto-classification in one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQueue {
    pub db_name: String,
    pub count: u64,
    pub batches: u64,
}

impl PendingQueue {
    pub fn new(db_name: impl Into<String>, count: u64, batch_size: u32) -> Self {
        Self {
            db_name: db_name.into(),
            count,
            batches: count.div_ceil(u64::from(batch_size.max(1))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub selection: Selection,
    pub highlighted: Option<SourceId>,
    pub cone: Option<ConeOverlay>,
    pub light_curve: Option<LightCurve>,
    pub results: Vec<ClassificationResult>,
    pub config_form: ConfigForm,
    pub import_form: ImportForm,
    pub databases: Vec<String>,
    pub current_database: Option<String>,
    pub pending: Option<PendingQueue>,
    classify: JobProgress,
    import: JobProgress,
    auto_classify: JobProgress,
    notices: VecDeque<Notice>,
}

impl AppState {
    pub fn progress(&self, kind: JobKind) -> &JobProgress {
        match kind {
            JobKind::Classify     => &self.classify,
            JobKind::Import       => &self.import,
            JobKind::AutoClassify => &self.auto_classify,
        }
    }

    pub fn progress_mut(&mut self, kind: JobKind) -> &mut JobProgress {
        match kind {
            JobKind::Classify     => &mut self.classify,
            JobKind::Import       => &mut self.import,
            JobKind::AutoClassify => &mut self.auto_classify,
        }
    }

    pub fn reset_progress(&mut self, kind: JobKind) {
        *self.progress_mut(kind) = JobProgress::default();
    }

    pub fn highlighted_object(&self) -> Option<&CelestialObject> {
        let id = self.highlighted.as_ref()?;
        self.selection.get(id.as_str()).map(|e| &e.object)
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == NOTICE_HISTORY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    /// Most recent notices, oldest first.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.back()
    }
}
