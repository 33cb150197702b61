use tdlight_common::Result;
use tracing::{info, instrument};

use crate::client::PortalClient;
use crate::sse::EventStream;
use crate::wire::{Ack, ImportRequest};

impl PortalClient {
    /// `GET /api/import/stream`
    #[instrument(skip(self))]
    pub async fn open_import_stream(&self) -> Result<EventStream> {
        self.open_stream(self.stream_request(&["api", "import", "stream"])).await
    }

    /// `POST /api/import/start`. Paths are checked locally first.
    #[instrument(skip(self, request), fields(kind = ?request.kind, db_name = %request.db_name))]
    pub async fn start_import(&self, request: &ImportRequest) -> Result<Ack> {
        request.validate()?;
        let ack: Ack = self.send(self.post(&["api", "import", "start"]).json(request)).await?;
        let ack = ack.into_result()?;
        info!("Import started");
        Ok(ack)
    }

    /// `POST /api/import/stop`
    #[instrument(skip(self))]
    pub async fn stop_import(&self) -> Result<Ack> {
        let ack: Ack = self.send(self.post(&["api", "import", "stop"])).await?;
        ack.into_result()
    }
}
