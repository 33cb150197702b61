//! Cone, region and ID searches, object viewing and sky-map picking.

use futures_util::future::join_all;
use tdlight_client::{ConeQuery, RegionQuery};
use tdlight_common::{CelestialObject, LightCurve, Result, SourceId};
use tracing::{debug, error, info, instrument, warn};

use crate::notice::NoticeKind;
use crate::portal::Portal;
use crate::skymap::{ConeOverlay, Viewport};

/// How search results combine with the current object list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Replace,
    Append,
}

/// Split free text into trimmed, non-empty identifiers, one per line.
pub fn parse_id_list(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl Portal {
    #[instrument(skip(self))]
    pub async fn cone_search(&mut self, ra: f64, dec: f64, radius: f64, mode: SearchMode) -> usize {
        let query = ConeQuery::new(ra, dec, radius).with_limit(self.settings.search.limit);
        if let Err(e) = query.validate() {
            self.notify(NoticeKind::InvalidSearchInput(e.user_message()));
            return 0;
        }
        let found = self.client.cone_search(&query).await;
        let cone = ConeOverlay { ra, dec, radius };
        self.absorb_results(found, mode, Some(cone))
    }

    #[instrument(skip(self))]
    pub async fn region_search(
        &mut self,
        ra_min: f64,
        ra_max: f64,
        dec_min: f64,
        dec_max: f64,
        mode: SearchMode,
    ) -> usize {
        let query = RegionQuery::new(ra_min, ra_max, dec_min, dec_max)
            .with_limit(self.settings.search.limit);
        if let Err(e) = query.validate() {
            self.notify(NoticeKind::InvalidSearchInput(e.user_message()));
            return 0;
        }
        let found = self.client.region_search(&query).await;
        self.absorb_results(found, mode, None)
    }

    /// Look up each line of `input` as a source id. Lookups run
    /// concurrently; results keep input order. A failed lookup counts as
    /// not found.
    #[instrument(skip(self, input))]
    pub async fn search_ids(&mut self, input: &str, mode: SearchMode) -> usize {
        let ids = parse_id_list(input);
        if ids.is_empty() {
            self.notify(NoticeKind::NoIdsEntered);
            return 0;
        }

        let client = &self.client;
        let lookups = join_all(ids.iter().map(|id| client.object_by_id(id))).await;

        let mut found = Vec::new();
        let mut not_found = Vec::new();
        for (id, lookup) in ids.iter().zip(lookups) {
            match lookup {
                Ok(objects) if !objects.is_empty() => found.extend(objects),
                Ok(_) => not_found.push(id.as_str()),
                Err(e) => {
                    debug!(id = %id, error = %e, "ID lookup failed");
                    not_found.push(id.as_str());
                }
            }
        }
        if !not_found.is_empty() {
            info!(ids = ?not_found, "IDs not found");
        }

        let first = found.iter().find(|o| o.table_name.is_some()).cloned();
        let added = self.absorb_results(Ok(found), mode, None);
        if let Some(obj) = first {
            self.state.highlighted = Some(obj.source_id.clone());
            self.load_light_curve_quietly(&obj).await;
        }
        added
    }

    /// Merge search results into the selection and report the outcome.
    fn absorb_results(
        &mut self,
        found: Result<Vec<CelestialObject>>,
        mode: SearchMode,
        cone: Option<ConeOverlay>,
    ) -> usize {
        let objects = match found {
            Ok(objects) => objects,
            Err(e) => {
                error!(error = %e, "Search failed");
                self.notify(NoticeKind::SearchFailed(e.user_message()));
                return 0;
            }
        };
        if objects.is_empty() {
            self.notify(NoticeKind::NothingFound);
            return 0;
        }

        match mode {
            SearchMode::Replace => {
                let count = self.state.selection.replace(objects);
                self.state.cone = cone;
                self.notify(NoticeKind::ObjectsFound { count });
                count
            }
            SearchMode::Append => {
                let count = self.state.selection.append(objects);
                self.state.cone = None;
                if count > 0 {
                    self.notify(NoticeKind::ObjectsAppended { count });
                } else {
                    self.notify(NoticeKind::AllAlreadyListed);
                }
                count
            }
        }
    }

    pub fn clear_objects(&mut self) {
        self.state.selection.clear();
        self.state.highlighted = None;
        self.state.cone = None;
        self.notify(NoticeKind::ListCleared);
    }

    // ── Viewing ─────────────────────────────────────────────

    /// Refresh one listed object's metadata and load its light curve.
    #[instrument(skip(self))]
    pub async fn view_object(&mut self, source_id: &str) -> bool {
        let table = self
            .state
            .selection
            .get(source_id)
            .and_then(|e| e.object.table_name.clone());
        let Some(table) = table else {
            self.notify(NoticeKind::ObjectUnavailable);
            return false;
        };

        match self.client.object_metadata(&table).await {
            Ok(Some(fresh)) => {
                if let Some(entry) = self.state.selection.get_mut(source_id) {
                    entry.object.merge_from(&fresh);
                }
            }
            Ok(None) => debug!(table = %table, "No fresh metadata"),
            Err(e) => warn!(error = %e, table = %table, "Metadata refresh failed"),
        }

        match self.client.fetch_light_curve(&table).await {
            Ok(resp) if !resp.data.is_empty() => {
                info!(source_id, points = resp.data.len(), "Light curve loaded");
                self.state.light_curve = Some(LightCurve {
                    source_id: SourceId::new(source_id),
                    points: resp.data,
                });
                self.state.highlighted = Some(SourceId::new(source_id));
                true
            }
            Ok(_) => {
                self.notify(NoticeKind::NoLightCurve);
                false
            }
            Err(e) => {
                error!(error = %e, table = %table, "Light curve fetch failed");
                self.notify(NoticeKind::LightCurveFailed(e.user_message()));
                false
            }
        }
    }

    /// List `source_id` alone and load its light curve with a single fetch.
    /// Metadata is only refreshed when the lookup left no curve loaded.
    #[instrument(skip(self))]
    pub async fn open_object(&mut self, source_id: &str) -> bool {
        let source_id = source_id.trim();
        self.state.light_curve = None;
        if self.search_ids(source_id, SearchMode::Replace).await == 0 {
            return false;
        }
        let loaded = self
            .state
            .light_curve
            .as_ref()
            .is_some_and(|curve| curve.source_id.as_str() == source_id);
        loaded || self.view_object(source_id).await
    }

    /// Highlight the listed object nearest to `(x, y)` on a sky map of
    /// `width` x `height` pixels and load its light curve.
    pub async fn pick_at(&mut self, width: f64, height: f64, x: f64, y: f64) -> Option<SourceId> {
        let picked = {
            let objects: Vec<&CelestialObject> = self.state.selection.objects().collect();
            let viewport = Viewport::fit(width, height, objects.iter().copied())?;
            viewport.hit_test(objects.iter().copied(), x, y)?.clone()
        };
        self.state.highlighted = Some(picked.source_id.clone());
        self.load_light_curve_quietly(&picked).await;
        Some(picked.source_id)
    }

    /// Sky-map viewport fitted to the current list.
    pub fn viewport(&self, width: f64, height: f64) -> Option<Viewport> {
        Viewport::fit(width, height, self.state.selection.objects())
    }

    /// Load a light curve for a highlighted object; failures are only
    /// logged.
    async fn load_light_curve_quietly(&mut self, obj: &CelestialObject) {
        let Some(table) = obj.table_name.as_deref() else {
            debug!(source_id = %obj.source_id, "No table name, light curve skipped");
            return;
        };
        match self.client.fetch_light_curve(table).await {
            Ok(resp) if !resp.data.is_empty() => {
                self.state.light_curve = Some(LightCurve {
                    source_id: obj.source_id.clone(),
                    points: resp.data,
                });
            }
            Ok(_) => debug!(table, "No light-curve data returned"),
            Err(e) => warn!(error = %e, table, "Failed to load light curve"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_list_drops_blank_lines() {
        let ids = parse_id_list("  4295806720 \n\n\r\n6917528997577384320\n   ");
        assert_eq!(ids, vec!["4295806720", "6917528997577384320"]);
    }
}
