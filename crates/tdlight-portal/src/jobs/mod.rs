//! Long-running backend jobs driven through their progress channels.
//!
//! Every job follows the same sequence: close the previous channel of its
//! kind, open a new one, send the start request, then pull updates with
//! [`Portal::next_update`] until a terminal event closes the channel and
//! runs the job's follow-up.
//!
//! The first event on a new channel is the backend's connect snapshot. A
//! terminal snapshot describes the previous run and is skipped.

mod auto_classify;
mod classify;
mod import;

use tdlight_common::progress::JobOutcome;
use tdlight_common::{JobKind, Result};
use tracing::{debug, info};

use crate::channel::ProgressChannel;
use crate::portal::Portal;

/// What one call to [`Portal::next_update`] observed.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    /// Progress in [`AppState::progress`](crate::AppState::progress) changed.
    Progress,
    /// A terminal event arrived; the channel is closed and the follow-up
    /// has run.
    Finished(JobOutcome),
    /// The stream ended without a terminal event. The job may still be
    /// running on the backend.
    Disconnected,
}

impl Portal {
    /// Replace the channel for `kind` with a freshly opened one.
    pub(crate) async fn open_channel(&mut self, kind: JobKind, task_id: Option<&str>) -> Result<()> {
        self.channels.close(kind);
        let stream = match kind {
            JobKind::Classify     => self.client.open_classify_stream(task_id.unwrap_or_default()).await?,
            JobKind::Import       => self.client.open_import_stream().await?,
            JobKind::AutoClassify => self.client.open_auto_classify_stream().await?,
        };
        let mut channel = ProgressChannel::new(kind, stream);
        if let Some(id) = task_id {
            channel = channel.with_task_id(id);
        }
        self.channels.replace(channel);
        debug!(%kind, "Progress channel open");
        Ok(())
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.channels.is_open(kind)
    }

    /// Close the channel for `kind` without contacting the backend.
    /// Returns `false` if none was open.
    pub fn close_channel(&mut self, kind: JobKind) -> bool {
        self.channels.close(kind)
    }

    /// Wait for the next meaningful event on `kind`'s channel. `None` when
    /// no channel is open.
    pub async fn next_update(&mut self, kind: JobKind) -> Option<JobUpdate> {
        loop {
            let channel = self.channels.get_mut(kind)?;
            let snapshot = channel.take_snapshot_flag();
            let event = match channel.next_event().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    debug!(%kind, error = %e, "Progress channel failed");
                    self.channels.close(kind);
                    return Some(JobUpdate::Disconnected);
                }
                None => {
                    debug!(%kind, "Progress channel ended");
                    self.channels.close(kind);
                    return Some(JobUpdate::Disconnected);
                }
            };
            if event.is_idle() {
                continue;
            }
            if snapshot && kind.outcome(&event).is_some() {
                debug!(%kind, status = ?event.status, percent = event.percent, "Ignoring terminal state left by an earlier run");
                continue;
            }

            let changed = self.state.progress_mut(kind).apply(kind, &event);
            if let Some(outcome) = kind.outcome(&event) {
                self.channels.close(kind);
                info!(%kind, ?outcome, "Job finished");
                self.finish(kind, &outcome).await;
                return Some(JobUpdate::Finished(outcome));
            }
            if changed {
                return Some(JobUpdate::Progress);
            }
        }
    }

    /// Pull updates until the job ends. `None` if the channel dropped first.
    pub async fn drive(&mut self, kind: JobKind) -> Option<JobOutcome> {
        while let Some(update) = self.next_update(kind).await {
            match update {
                JobUpdate::Progress          => continue,
                JobUpdate::Finished(outcome) => return Some(outcome),
                JobUpdate::Disconnected      => return None,
            }
        }
        None
    }

    async fn finish(&mut self, kind: JobKind, outcome: &JobOutcome) {
        match kind {
            JobKind::Classify     => self.finish_classification(outcome).await,
            JobKind::Import       => self.finish_import(outcome).await,
            JobKind::AutoClassify => self.finish_auto_classify(outcome).await,
        }
    }
}
