//! tdlight-test-utils - In-process stand-in for the portal backend.
//!
//! [`MockBackend`] serves the same routes as the real backend from an axum
//! router bound to an ephemeral localhost port. Catalog contents, job
//! progress scripts and start-request rejections are configurable, and
//! every request is recorded for assertions.

pub mod fixtures;
mod handlers;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tdlight_common::{JobKind, ProgressEvent};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

pub use state::{MockData, MockState, RecordedRequest, Script, SharedMock};

pub fn build_router(state: SharedMock) -> Router {
    Router::new()
        .route("/api/config",                   get(handlers::get_config).post(handlers::save_config))
        .route("/api/config/reload",            get(handlers::reload_config))
        .route("/api/databases",                get(handlers::list_databases))
        .route("/api/database/drop",            post(handlers::drop_database))
        .route("/api/cone_search",              get(handlers::cone_search))
        .route("/api/region_search",            get(handlers::region_search))
        .route("/api/object_by_id",             get(handlers::object_by_id))
        .route("/api/object/{table}",           get(handlers::object_by_table))
        .route("/api/lightcurve/{table}",       get(handlers::light_curve))
        .route("/api/classify_stream",          get(handlers::classify_stream))
        .route("/api/classify_objects",         post(handlers::classify_objects))
        .route("/api/classify_results",         get(handlers::classify_results))
        .route("/api/classify_stop",            get(handlers::classify_stop))
        .route("/api/import/stream",            get(handlers::import_stream))
        .route("/api/import/start",             post(handlers::import_start))
        .route("/api/import/stop",              post(handlers::import_stop))
        .route("/api/auto_classify/check",      post(handlers::auto_check))
        .route("/api/auto_classify/candidates", get(handlers::auto_candidates))
        .route("/api/auto_classify/stream",     get(handlers::auto_classify_stream))
        .route("/api/auto_classify/start",      post(handlers::auto_start))
        .route("/api/auto_classify/stop",       post(handlers::auto_stop))
        .layer(axum::middleware::from_fn_with_state(state.clone(), handlers::record_requests))
        .with_state(state)
}

/// A running mock backend. The server task is aborted on drop.
pub struct MockBackend {
    addr: SocketAddr,
    state: SharedMock,
    server: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(MockData::default()).await
    }

    pub async fn start_with(data: MockData) -> std::io::Result<Self> {
        let state = Arc::new(MockState::new(data));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = build_router(state.clone());
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                debug!(error = %e, "Mock backend stopped");
            }
        });
        debug!(%addr, "Mock backend listening");
        Ok(Self { addr, state, server })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &SharedMock {
        &self.state
    }

    /// Events to replay on `kind`'s stream after its next start request.
    pub fn script(&self, kind: JobKind, events: &[ProgressEvent]) {
        let payloads = events
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect();
        self.script_raw(kind, payloads, false);
    }

    /// Like [`script`](Self::script), with raw payloads and an optional
    /// server-side hang-up after the last one.
    pub fn script_raw(&self, kind: JobKind, payloads: Vec<String>, hang_up: bool) {
        self.state
            .data()
            .scripts
            .insert(kind, Script { payloads, hang_up });
    }

    /// Open every new `kind` stream with `event` instead of the idle
    /// greeting, as a backend still holding an earlier run's state does.
    pub fn snapshot(&self, kind: JobKind, event: &ProgressEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.state.data().snapshots.insert(kind, payload);
        }
    }

    /// Make the next start request for `kind` fail with `error`.
    pub fn reject_start(&self, kind: JobKind, error: &str) {
        self.state.data().rejections.insert(kind, error.to_string());
    }

    pub fn set_pending(&self, count: u64) {
        self.state.data().pending = count;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.data().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .data()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Index of the first request to `path`, for ordering assertions.
    pub fn position_of(&self, path: &str) -> Option<usize> {
        self.state.data().requests.iter().position(|r| r.path == path)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A localhost URL nothing listens on, for connection-failure tests.
pub async fn unreachable_base_url() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}
