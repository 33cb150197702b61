use tdlight_common::{CelestialObject, Result};
use tracing::{debug, instrument};

use crate::client::PortalClient;
use crate::wire::{ConeQuery, ObjectList, RegionQuery};

impl PortalClient {
    /// `GET /api/cone_search`
    #[instrument(skip(self))]
    pub async fn cone_search(&self, query: &ConeQuery) -> Result<Vec<CelestialObject>> {
        query.validate()?;
        let list: ObjectList = self.send(self.get(&["api", "cone_search"]).query(query)).await?;
        debug!(count = list.objects.len(), "Cone search returned");
        Ok(list.objects)
    }

    /// `GET /api/region_search`
    #[instrument(skip(self))]
    pub async fn region_search(&self, query: &RegionQuery) -> Result<Vec<CelestialObject>> {
        query.validate()?;
        let list: ObjectList = self.send(self.get(&["api", "region_search"]).query(query)).await?;
        debug!(count = list.objects.len(), "Region search returned");
        Ok(list.objects)
    }

    /// `GET /api/object_by_id`. An unknown id yields an empty list.
    #[instrument(skip(self))]
    pub async fn object_by_id(&self, source_id: &str) -> Result<Vec<CelestialObject>> {
        let list: ObjectList = self
            .send(self.get(&["api", "object_by_id"]).query(&[("id", source_id)]))
            .await?;
        Ok(list.objects)
    }

    /// `GET /api/object/{table}`: fresh metadata for one light-curve table.
    #[instrument(skip(self))]
    pub async fn object_metadata(&self, table_name: &str) -> Result<Option<CelestialObject>> {
        let list: ObjectList = self.send(self.get(&["api", "object", table_name])).await?;
        Ok(list.objects.into_iter().next())
    }
}
