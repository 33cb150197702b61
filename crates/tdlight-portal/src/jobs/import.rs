use tdlight_client::ImportKind;
use tdlight_common::progress::JobOutcome;
use tdlight_common::JobKind;
use tracing::{error, info, instrument, warn};

use crate::notice::NoticeKind;
use crate::portal::Portal;

impl Portal {
    /// Start a catalog or light-curve import from the import form. Worker
    /// counts come from the settings form.
    #[instrument(skip(self))]
    pub async fn start_import(&mut self, kind: ImportKind) -> bool {
        let request = self.state.import_form.request(kind, &self.state.config_form);
        if let Err(e) = request.validate() {
            self.notify(NoticeKind::ImportInputMissing(e.user_message()));
            return false;
        }

        self.state.reset_progress(JobKind::Import);
        if let Err(e) = self.open_channel(JobKind::Import, None).await {
            error!(error = %e, "Could not open import stream");
            self.notify(NoticeKind::ImportFailed(e.user_message()));
            return false;
        }

        match self.client.start_import(&request).await.and_then(|ack| ack.into_result()) {
            Ok(_) => {
                info!(kind = ?request.kind, path = %request.path, db_name = %request.db_name, "Import started");
                self.notify(NoticeKind::ImportStarted);
                true
            }
            Err(e) => {
                error!(error = %e, "Import start failed");
                self.channels.close(JobKind::Import);
                self.notify(NoticeKind::ImportFailed(e.user_message()));
                false
            }
        }
    }

    pub(super) async fn finish_import(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed => {
                self.notify(NoticeKind::ImportCompleted);
                let count = self.refresh_pending_count(true).await;
                if count > 0 {
                    self.notify(NoticeKind::PendingDetected { count });
                }
            }
            JobOutcome::Stopped | JobOutcome::Paused => self.notify(NoticeKind::ImportStopped),
            JobOutcome::Failed(message) => self.notify(NoticeKind::ImportError(message.clone())),
        }
    }

    /// Ask the backend to stop, then close the channel.
    #[instrument(skip(self))]
    pub async fn stop_import(&mut self) -> bool {
        let stopped = self.client.stop_import().await.and_then(|ack| ack.into_result());
        self.channels.close(JobKind::Import);
        match stopped {
            Ok(_) => {
                info!("Import stop requested");
                self.notify(NoticeKind::ImportStopped);
                true
            }
            Err(e) => {
                warn!(error = %e, "Import stop failed");
                self.notify(NoticeKind::StopFailed(e.user_message()));
                false
            }
        }
    }
}
