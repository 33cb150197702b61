//! Mutable state behind the mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tdlight_common::backend_config::BackendConfig;
use tdlight_common::{CelestialObject, ClassificationResult, JobKind, LightCurvePoint};
use tokio::sync::broadcast;

use crate::fixtures;

/// `None` on a stream channel tells every subscriber to hang up.
pub(crate) type StreamMessage = Option<String>;

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// Value of one query parameter, percent-decoding not applied.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then_some(v)
        })
    }
}

/// Events replayed on a job's stream once its start request arrives.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub payloads: Vec<String>,
    pub hang_up: bool,
}

pub struct MockData {
    pub config: BackendConfig,
    pub databases: Vec<String>,
    pub catalog: Vec<CelestialObject>,
    pub light_curves: HashMap<String, Vec<LightCurvePoint>>,
    pub classify_results: Vec<ClassificationResult>,
    pub pending: u64,
    pub scripts: HashMap<JobKind, Script>,
    /// First payload sent to each new subscriber, in place of the idle
    /// greeting.
    pub snapshots: HashMap<JobKind, String>,
    pub rejections: HashMap<JobKind, String>,
    pub requests: Vec<RecordedRequest>,
}

impl Default for MockData {
    fn default() -> Self {
        let catalog = fixtures::sample_catalog();
        let light_curves = catalog
            .iter()
            .filter_map(|o| o.table_name.clone())
            .map(|table| (table, fixtures::sample_light_curve(40)))
            .collect();
        Self {
            config: fixtures::sample_config(),
            databases: vec![
                "information_schema".into(),
                "gaiadr2_lc".into(),
                "performance_schema".into(),
                "ztf_dr3".into(),
            ],
            catalog,
            light_curves,
            classify_results: fixtures::sample_results(),
            pending: 0,
            scripts: HashMap::new(),
            snapshots: HashMap::new(),
            rejections: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

pub struct MockState {
    data: Mutex<MockData>,
    streams: HashMap<JobKind, broadcast::Sender<StreamMessage>>,
    pub(crate) event_gap: Duration,
}

pub type SharedMock = Arc<MockState>;

impl MockState {
    pub(crate) fn new(data: MockData) -> Self {
        let streams = JobKind::ALL
            .iter()
            .map(|&kind| (kind, broadcast::channel(256).0))
            .collect();
        Self {
            data: Mutex::new(data),
            streams,
            event_gap: Duration::from_millis(5),
        }
    }

    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn subscribe(&self, kind: JobKind) -> broadcast::Receiver<StreamMessage> {
        self.sender(kind).subscribe()
    }

    fn sender(&self, kind: JobKind) -> &broadcast::Sender<StreamMessage> {
        // Every kind gets a channel in `new`.
        &self.streams[&kind]
    }

    /// Push one raw payload to current subscribers of `kind`.
    pub fn push(&self, kind: JobKind, payload: String) {
        let _ = self.sender(kind).send(Some(payload));
    }

    pub fn hang_up(&self, kind: JobKind) {
        let _ = self.sender(kind).send(None);
    }

    /// Replay the configured script for `kind` in the background.
    pub(crate) fn play_script(self: &Arc<Self>, kind: JobKind) {
        let script = self.data().scripts.get(&kind).cloned().unwrap_or_default();
        let state = Arc::clone(self);
        tokio::spawn(async move {
            for payload in script.payloads {
                tokio::time::sleep(state.event_gap).await;
                state.push(kind, payload);
            }
            if script.hang_up {
                tokio::time::sleep(state.event_gap).await;
                state.hang_up(kind);
            }
        });
    }
}
