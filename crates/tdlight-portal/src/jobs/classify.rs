use tdlight_client::{new_task_id, ClassifyTarget};
use tdlight_common::progress::JobOutcome;
use tdlight_common::JobKind;
use tracing::{error, info, instrument, warn};

use crate::notice::NoticeKind;
use crate::portal::Portal;

/// Stage index shown once results are on screen.
const RESULTS_STAGE: usize = 3;

impl Portal {
    /// Classify every enabled object in the list.
    #[instrument(skip(self))]
    pub async fn start_classification(&mut self) -> bool {
        let targets: Vec<ClassifyTarget> =
            self.state.selection.enabled().map(ClassifyTarget::from).collect();
        if targets.is_empty() {
            self.notify(NoticeKind::NothingSelected);
            return false;
        }

        let task_id = new_task_id();
        self.state.reset_progress(JobKind::Classify);
        self.state.progress_mut(JobKind::Classify).stage = Some(0);
        if let Err(e) = self.open_channel(JobKind::Classify, Some(&task_id)).await {
            error!(error = %e, "Could not open classification stream");
            self.notify(NoticeKind::ClassificationFailed(e.user_message()));
            return false;
        }

        match self.client.submit_classification(&task_id, &targets).await {
            Ok(started) => {
                info!(task_id = %task_id, count = ?started.count, "Classification started");
                true
            }
            Err(e) => {
                error!(error = %e, "Classification start failed");
                self.channels.close(JobKind::Classify);
                self.notify(NoticeKind::ClassificationFailed(e.user_message()));
                false
            }
        }
    }

    pub(super) async fn finish_classification(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => {
                tokio::time::sleep(self.settings.classification.results_delay()).await;
                let limit = self.settings.classification.results_limit;
                match self.client.classify_results(limit).await {
                    Ok(results) if !results.is_empty() => {
                        let count = results.len();
                        self.state.results = results;
                        self.state.progress_mut(JobKind::Classify).stage = Some(RESULTS_STAGE);
                        self.notify(NoticeKind::ClassificationFinished { count });
                    }
                    Ok(_) => self.notify(NoticeKind::NoClassificationResults),
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch classification results");
                        self.notify(NoticeKind::ClassificationFailed(e.user_message()));
                    }
                }
            }
            JobOutcome::Stopped | JobOutcome::Paused => self.notify(NoticeKind::ClassificationStopped),
            JobOutcome::Failed(message) => {
                self.notify(NoticeKind::ClassificationFailed(message.clone()))
            }
        }
    }

    /// Close the channel, then ask the backend to stop.
    #[instrument(skip(self))]
    pub async fn stop_classification(&mut self) -> bool {
        self.channels.close(JobKind::Classify);
        match self.client.stop_classification().await {
            Ok(_) => {
                info!("Classification stop requested");
                self.notify(NoticeKind::ClassificationStopped);
                true
            }
            Err(e) => {
                error!(error = %e, "Classification stop failed");
                self.notify(NoticeKind::StopFailed(e.user_message()));
                false
            }
        }
    }
}
