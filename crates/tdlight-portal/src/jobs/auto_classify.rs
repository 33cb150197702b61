use tdlight_client::AutoClassifyRequest;
use tdlight_common::progress::JobOutcome;
use tdlight_common::JobKind;
use tracing::{error, info, instrument};

use crate::notice::NoticeKind;
use crate::portal::Portal;

impl Portal {
    /// Start or resume the batched sweep over the pending queue of the
    /// import database.
    #[instrument(skip(self))]
    pub async fn start_auto_classify(&mut self, resume: bool) -> bool {
        let request = AutoClassifyRequest {
            resume,
            batch_size: self.state.import_form.batch_size_value(),
            db_name: self.state.import_form.db_name().to_string(),
        };

        self.state.reset_progress(JobKind::AutoClassify);
        if let Err(e) = self.open_channel(JobKind::AutoClassify, None).await {
            error!(error = %e, "Could not open auto-classification stream");
            self.notify(NoticeKind::AutoClassifyFailed(e.user_message()));
            return false;
        }

        match self.client.start_auto_classify(&request).await.and_then(|ack| ack.into_result()) {
            Ok(ack) => {
                let count = ack.count.unwrap_or_default();
                info!(resume, batch_size = request.batch_size, count, "Auto-classification started");
                self.notify(NoticeKind::AutoClassifyStarted { count });
                true
            }
            Err(e) => {
                error!(error = %e, "Auto-classification start failed");
                self.channels.close(JobKind::AutoClassify);
                self.notify(NoticeKind::AutoClassifyFailed(e.user_message()));
                false
            }
        }
    }

    pub(super) async fn finish_auto_classify(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => {
                self.notify(NoticeKind::AutoClassifyCompleted);
                self.refresh_pending_count(true).await;
            }
            JobOutcome::Paused          => self.notify(NoticeKind::AutoClassifyPaused),
            JobOutcome::Stopped         => self.notify(NoticeKind::AutoClassifyStopped),
            JobOutcome::Failed(message) => self.notify(NoticeKind::AutoClassifyError(message.clone())),
        }
    }

    /// Close the channel, then ask the backend to stop after the current
    /// batch.
    #[instrument(skip(self))]
    pub async fn stop_auto_classify(&mut self) -> bool {
        self.channels.close(JobKind::AutoClassify);
        match self.client.stop_auto_classify().await.and_then(|ack| ack.into_result()) {
            Ok(_) => {
                info!("Auto-classification stop requested");
                self.notify(NoticeKind::AutoClassifyStopped);
                true
            }
            Err(e) => {
                error!(error = %e, "Auto-classification stop failed");
                self.notify(NoticeKind::StopFailed(e.user_message()));
                false
            }
        }
    }
}
