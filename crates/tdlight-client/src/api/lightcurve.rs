use tdlight_common::Result;
use tracing::{debug, instrument};

use crate::client::PortalClient;
use crate::wire::LightCurveResponse;

impl PortalClient {
    /// `GET /api/lightcurve/{table}`
    #[instrument(skip(self))]
    pub async fn fetch_light_curve(&self, table_name: &str) -> Result<LightCurveResponse> {
        let resp: LightCurveResponse = self.send(self.get(&["api", "lightcurve", table_name])).await?;
        debug!(points = resp.data.len(), "Light curve fetched");
        Ok(resp)
    }
}
