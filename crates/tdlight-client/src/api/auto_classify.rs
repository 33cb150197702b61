use tdlight_common::Result;
use tracing::{info, instrument};

use crate::client::PortalClient;
use crate::sse::EventStream;
use crate::wire::{Ack, AutoClassifyRequest, Candidates, DbNameBody};

impl PortalClient {
    /// `POST /api/auto_classify/check`: scan `db_name` for new or grown
    /// light curves. An empty name lets the backend use its configured
    /// database; the reply names the one it used.
    #[instrument(skip(self))]
    pub async fn check_pending(&self, db_name: &str) -> Result<Ack> {
        let ack: Ack = self
            .send(self.post(&["api", "auto_classify", "check"]).json(&DbNameBody { db_name }))
            .await?;
        ack.into_result()
    }

    /// `GET /api/auto_classify/candidates?db_name=`: read the existing
    /// queue without rescanning.
    #[instrument(skip(self))]
    pub async fn candidates(&self, db_name: &str) -> Result<Candidates> {
        self.send(
            self.get(&["api", "auto_classify", "candidates"])
                .query(&[("db_name", db_name)]),
        )
        .await
    }

    /// `GET /api/auto_classify/stream`
    #[instrument(skip(self))]
    pub async fn open_auto_classify_stream(&self) -> Result<EventStream> {
        self.open_stream(self.stream_request(&["api", "auto_classify", "stream"])).await
    }

    /// `POST /api/auto_classify/start`
    #[instrument(skip(self))]
    pub async fn start_auto_classify(&self, request: &AutoClassifyRequest) -> Result<Ack> {
        let ack: Ack = self
            .send(self.post(&["api", "auto_classify", "start"]).json(request))
            .await?;
        let ack = ack.into_result()?;
        info!(count = ?ack.count, "Auto-classification started");
        Ok(ack)
    }

    /// `POST /api/auto_classify/stop`
    #[instrument(skip(self))]
    pub async fn stop_auto_classify(&self) -> Result<Ack> {
        let ack: Ack = self.send(self.post(&["api", "auto_classify", "stop"])).await?;
        ack.into_result()
    }
}
