//! Route handlers mirroring the portal backend's HTTP surface.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tdlight_common::{CelestialObject, JobKind};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::state::{RecordedRequest, SharedMock};

type Params = Query<HashMap<String, String>>;

fn param(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.parse().ok())
}

fn bad_request(error: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": error }))).into_response()
}

// ── Request log ─────────────────────────────────────────────

pub async fn record_requests(State(state): State<SharedMock>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.data().requests.push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body: serde_json::from_slice(&bytes).ok(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// ── Config ──────────────────────────────────────────────────

pub async fn get_config(State(state): State<SharedMock>) -> Json<Value> {
    Json(json!(state.data().config))
}

pub async fn save_config(State(state): State<SharedMock>, Json(body): Json<Value>) -> Json<Value> {
    let mut data = state.data();
    let cfg = &mut data.config;
    if let Some(name) = body["db_name"].as_str() {
        cfg.database.name = Some(name.to_string());
    }
    if let Some(host) = body["db_host"].as_str() {
        cfg.database.host = Some(host.to_string());
    }
    if let Some(port) = body["db_port"].as_u64() {
        cfg.database.port = u16::try_from(port).ok();
    }
    if let Some(threads) = body["threads"].as_u64() {
        cfg.import.threads = u32::try_from(threads).ok();
    }
    if let Some(vgroups) = body["vgroups"].as_u64() {
        cfg.import.vgroups = u32::try_from(vgroups).ok();
    }
    if let Some(threshold) = body["confidence_threshold"].as_f64() {
        cfg.classification.confidence_threshold = Some(threshold);
    }
    Json(json!({ "success": true, "message": "Config saved", "config": cfg }))
}

pub async fn reload_config(State(state): State<SharedMock>) -> Json<Value> {
    let data = state.data();
    Json(json!({ "success": true, "message": "Config reloaded", "config": data.config }))
}

// ── Databases ───────────────────────────────────────────────

pub async fn list_databases(State(state): State<SharedMock>) -> Json<Value> {
    let data = state.data();
    Json(json!({ "databases": data.databases, "current": data.config.database.name }))
}

pub async fn drop_database(State(state): State<SharedMock>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["db_name"].as_str().unwrap_or_default().to_string();
    let mut data = state.data();
    let before = data.databases.len();
    data.databases.retain(|db| *db != name);
    if data.databases.len() < before {
        Json(json!({ "success": true, "message": format!("Database {} dropped", name) }))
    } else {
        Json(json!({ "success": false, "error": format!("Database {} does not exist", name) }))
    }
}

// ── Search ──────────────────────────────────────────────────

fn objects(list: Vec<CelestialObject>) -> Json<Value> {
    Json(json!({ "objects": list }))
}

fn limit(params: &HashMap<String, String>) -> usize {
    params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(200)
}

pub async fn cone_search(State(state): State<SharedMock>, Query(params): Params) -> Response {
    let (Some(ra0), Some(dec0), Some(radius)) =
        (param(&params, "ra"), param(&params, "dec"), param(&params, "radius"))
    else {
        return bad_request("Missing ra, dec or radius");
    };
    let cos_dec = dec0.to_radians().cos();
    let hits = state
        .data()
        .catalog
        .iter()
        .filter(|o| {
            o.position().is_some_and(|(ra, dec)| {
                let dra = ((ra - ra0 + 540.0) % 360.0 - 180.0) * cos_dec;
                (dra * dra + (dec - dec0) * (dec - dec0)).sqrt() <= radius
            })
        })
        .take(limit(&params))
        .cloned()
        .collect();
    objects(hits).into_response()
}

pub async fn region_search(State(state): State<SharedMock>, Query(params): Params) -> Response {
    let bounds = ["ra_min", "ra_max", "dec_min", "dec_max"].map(|k| param(&params, k));
    let [Some(ra_min), Some(ra_max), Some(dec_min), Some(dec_max)] = bounds else {
        return bad_request("Missing region bounds");
    };
    let hits = state
        .data()
        .catalog
        .iter()
        .filter(|o| {
            o.position().is_some_and(|(ra, dec)| {
                (ra_min..=ra_max).contains(&ra) && (dec_min..=dec_max).contains(&dec)
            })
        })
        .take(limit(&params))
        .cloned()
        .collect();
    objects(hits).into_response()
}

pub async fn object_by_id(State(state): State<SharedMock>, Query(params): Params) -> Json<Value> {
    let id = params.get("id").map(|s| s.trim().to_string()).unwrap_or_default();
    let hits = state
        .data()
        .catalog
        .iter()
        .filter(|o| o.source_id.as_str() == id)
        .cloned()
        .collect();
    objects(hits)
}

pub async fn object_by_table(State(state): State<SharedMock>, Path(table): Path<String>) -> Json<Value> {
    let hits = state
        .data()
        .catalog
        .iter()
        .filter(|o| o.table_name.as_deref() == Some(table.as_str()))
        .cloned()
        .collect();
    objects(hits)
}

pub async fn light_curve(State(state): State<SharedMock>, Path(table): Path<String>) -> Response {
    match state.data().light_curves.get(&table) {
        Some(points) => {
            Json(json!({ "metadata": { "table_name": table }, "data": points })).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Table not found" }))).into_response(),
    }
}

// ── Progress streams ────────────────────────────────────────

fn greeting(kind: JobKind) -> Value {
    match kind {
        JobKind::Classify => json!({ "percent": 0, "message": "Waiting...", "step": "" }),
        JobKind::Import | JobKind::AutoClassify => {
            json!({ "percent": 0, "message": "Waiting...", "status": "idle" })
        }
    }
}

fn progress_stream(
    state: &SharedMock,
    kind: JobKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe(kind);
    let snapshot = state
        .data()
        .snapshots
        .get(&kind)
        .cloned()
        .unwrap_or_else(|| greeting(kind).to_string());
    let first = tokio_stream::once(Ok::<_, Infallible>(Event::default().data(snapshot)));
    let live = BroadcastStream::new(rx)
        .filter_map(|msg| msg.ok())
        .take_while(|msg| msg.is_some())
        .filter_map(|msg| msg.map(|data| Ok::<_, Infallible>(Event::default().data(data))));

    Sse::new(first.chain(live)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

pub async fn classify_stream(
    State(state): State<SharedMock>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    progress_stream(&state, JobKind::Classify)
}

pub async fn import_stream(
    State(state): State<SharedMock>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    progress_stream(&state, JobKind::Import)
}

pub async fn auto_classify_stream(
    State(state): State<SharedMock>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    progress_stream(&state, JobKind::AutoClassify)
}

fn rejection(state: &SharedMock, kind: JobKind) -> Option<String> {
    state.data().rejections.get(&kind).cloned()
}

// ── Classification ──────────────────────────────────────────

pub async fn classify_objects(State(state): State<SharedMock>, Json(body): Json<Value>) -> Json<Value> {
    if let Some(error) = rejection(&state, JobKind::Classify) {
        return Json(json!({ "error": error }));
    }
    let count = body["objects"].as_array().map(Vec::len).unwrap_or_default();
    state.play_script(JobKind::Classify);
    Json(json!({ "started": true, "count": count, "message": "Classification started" }))
}

pub async fn classify_results(State(state): State<SharedMock>, Query(params): Params) -> Json<Value> {
    let data = state.data();
    let results: Vec<_> = data.classify_results.iter().take(limit(&params)).cloned().collect();
    Json(json!({ "count": results.len(), "results": results }))
}

pub async fn classify_stop() -> Json<Value> {
    Json(json!({ "success": true, "message": "Classification stopped" }))
}

// ── Import ──────────────────────────────────────────────────

pub async fn import_start(State(state): State<SharedMock>, Json(body): Json<Value>) -> Response {
    let path = body["path"].as_str().unwrap_or_default();
    let coords = body["coords_path"].as_str().unwrap_or_default();
    if path.is_empty() || coords.is_empty() {
        return bad_request("Missing path or coords_path");
    }
    if let Some(error) = rejection(&state, JobKind::Import) {
        return Json(json!({ "success": false, "error": error })).into_response();
    }
    state.play_script(JobKind::Import);
    Json(json!({ "success": true, "message": "Import started" })).into_response()
}

pub async fn import_stop(State(state): State<SharedMock>) -> Json<Value> {
    state.push(
        JobKind::Import,
        json!({ "percent": 0, "message": "Manually stopped", "status": "stopped" }).to_string(),
    );
    Json(json!({ "success": true, "message": "Import stopped" }))
}

// ── Auto-classification ─────────────────────────────────────

fn resolve_db(state: &SharedMock, requested: &str) -> String {
    if requested.is_empty() {
        state.data().config.database.name.clone().unwrap_or_default()
    } else {
        requested.to_string()
    }
}

pub async fn auto_check(State(state): State<SharedMock>, Json(body): Json<Value>) -> Json<Value> {
    let db_name = resolve_db(&state, body["db_name"].as_str().unwrap_or_default());
    let count = state.data().pending;
    Json(json!({
        "success": true,
        "count": count,
        "message": format!("{} light curves pending", count),
        "db_name": db_name,
    }))
}

pub async fn auto_candidates(State(state): State<SharedMock>, Query(params): Params) -> Json<Value> {
    let db_name = resolve_db(&state, params.get("db_name").map(String::as_str).unwrap_or_default());
    let count = state.data().pending;
    Json(json!({ "count": count, "file": format!("candidates_{}.csv", db_name), "db_name": db_name }))
}

pub async fn auto_start(State(state): State<SharedMock>, Json(body): Json<Value>) -> Response {
    let resume = body["resume"].as_bool().unwrap_or(false);
    let db_name = resolve_db(&state, body["db_name"].as_str().unwrap_or_default());
    let count = state.data().pending;
    if count == 0 && !resume {
        return bad_request("Queue is empty, run check first");
    }
    if let Some(error) = rejection(&state, JobKind::AutoClassify) {
        return bad_request(&error);
    }
    state.play_script(JobKind::AutoClassify);
    Json(json!({
        "success": true,
        "count": count,
        "message": "Auto-classification started",
        "db_name": db_name,
    }))
    .into_response()
}

pub async fn auto_stop() -> Json<Value> {
    Json(json!({ "success": true, "message": "Stop requested" }))
}
