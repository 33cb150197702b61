use tdlight_common::backend_config::{BackendConfig, ConfigUpdate};
use tdlight_common::Result;
use tracing::{info, instrument};

use crate::client::PortalClient;
use crate::wire::Ack;

impl PortalClient {
    /// `GET /api/config`
    #[instrument(skip(self))]
    pub async fn fetch_config(&self) -> Result<BackendConfig> {
        self.send(self.get(&["api", "config"])).await
    }

    /// `POST /api/config`. The backend persists the values; they take
    /// effect on reload or restart.
    #[instrument(skip(self, update), fields(db_name = %update.db_name))]
    pub async fn save_config(&self, update: &ConfigUpdate) -> Result<Ack> {
        let ack: Ack = self.send(self.post(&["api", "config"]).json(update)).await?;
        let ack = ack.into_result()?;
        info!("Backend config saved");
        Ok(ack)
    }

    /// `GET /api/config/reload`
    #[instrument(skip(self))]
    pub async fn reload_config(&self) -> Result<Ack> {
        let ack: Ack = self.send(self.get(&["api", "config", "reload"])).await?;
        ack.into_result()
    }
}
