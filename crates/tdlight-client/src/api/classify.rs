use tdlight_common::{ClassificationResult, Result, TdlightError};
use tracing::{info, instrument};

use crate::client::PortalClient;
use crate::sse::EventStream;
use crate::wire::{Ack, ClassifyBody, ClassifyResults, ClassifyStarted, ClassifyTarget};

/// Client-generated task id: the current epoch time in milliseconds.
pub fn new_task_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

impl PortalClient {
    /// `GET /api/classify_stream?task_id=`. Open this before submitting so
    /// no early progress is missed.
    #[instrument(skip(self))]
    pub async fn open_classify_stream(&self, task_id: &str) -> Result<EventStream> {
        self.open_stream(
            self.stream_request(&["api", "classify_stream"])
                .query(&[("task_id", task_id)]),
        )
        .await
    }

    /// `POST /api/classify_objects?task_id=`
    #[instrument(skip(self, targets), fields(count = targets.len()))]
    pub async fn submit_classification(
        &self,
        task_id: &str,
        targets: &[ClassifyTarget],
    ) -> Result<ClassifyStarted> {
        let started: ClassifyStarted = self
            .send(
                self.post(&["api", "classify_objects"])
                    .query(&[("task_id", task_id)])
                    .json(&ClassifyBody { objects: targets }),
            )
            .await?;
        if let Some(error) = started.error.clone() {
            return Err(TdlightError::Rejected(error));
        }
        info!(task_id, count = ?started.count, "Classification submitted");
        Ok(started)
    }

    /// `GET /api/classify_results?limit=`
    #[instrument(skip(self))]
    pub async fn classify_results(&self, limit: u32) -> Result<Vec<ClassificationResult>> {
        let results: ClassifyResults = self
            .send(self.get(&["api", "classify_results"]).query(&[("limit", limit)]))
            .await?;
        match results.error {
            Some(error) => Err(TdlightError::Rejected(error)),
            None => Ok(results.results),
        }
    }

    /// `GET /api/classify_stop`
    #[instrument(skip(self))]
    pub async fn stop_classification(&self) -> Result<Ack> {
        let ack: Ack = self.send(self.get(&["api", "classify_stop"])).await?;
        ack.into_result()
    }
}
