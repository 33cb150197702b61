use tdlight_common::Result;
use tracing::{instrument, warn};

use crate::client::PortalClient;
use crate::wire::{Ack, DatabaseList, DbNameBody};

impl PortalClient {
    /// `GET /api/databases`
    #[instrument(skip(self))]
    pub async fn list_databases(&self) -> Result<DatabaseList> {
        self.send(self.get(&["api", "databases"])).await
    }

    /// `POST /api/database/drop`. Irreversible on the backend side.
    #[instrument(skip(self))]
    pub async fn drop_database(&self, db_name: &str) -> Result<Ack> {
        warn!(db_name, "Requesting database drop");
        let ack: Ack = self
            .send(self.post(&["api", "database", "drop"]).json(&DbNameBody { db_name }))
            .await?;
        ack.into_result()
    }
}
