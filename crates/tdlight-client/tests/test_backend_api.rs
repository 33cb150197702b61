//! Exercise every client call against the in-process mock backend.

use pretty_assertions::assert_eq;
use tdlight_client::{
    new_task_id, AutoClassifyRequest, ClassifyTarget, ConeQuery, ImportKind, ImportRequest,
    PortalClient, RegionQuery,
};
use tdlight_common::backend_config::ConfigUpdate;
use tdlight_common::{JobKind, JobStatus, ProgressEvent, TdlightError};
use tdlight_test_utils::{fixtures, unreachable_base_url, MockBackend};

async fn setup() -> (MockBackend, PortalClient) {
    let mock = MockBackend::start().await.unwrap();
    let client = PortalClient::from_base_url(&mock.base_url()).unwrap();
    (mock, client)
}

#[tokio::test]
async fn test_fetch_and_save_config() {
    let (mock, client) = setup().await;

    let cfg = client.fetch_config().await.unwrap();
    assert_eq!(cfg.database_name(), Some("gaiadr2_lc"));
    assert_eq!(cfg.healpix.nside, Some(64));

    let update = ConfigUpdate {
        db_name: "ztf_dr3".into(),
        db_host: "10.0.0.7".into(),
        db_port: 6041,
        threads: Some(8),
        vgroups: Some(16),
        confidence_threshold: 0.9,
    };
    let ack = client.save_config(&update).await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.config.unwrap().database_name(), Some("ztf_dr3"));

    let body = mock.requests_to("/api/config").last().unwrap().body.clone().unwrap();
    assert_eq!(body["threads"], 8);
    assert_eq!(body["db_port"], 6041);
}

#[tokio::test]
async fn test_connection_refused_is_http_error() {
    let client = PortalClient::from_base_url(&unreachable_base_url().await.unwrap()).unwrap();
    let err = client.fetch_config().await.unwrap_err();
    assert!(matches!(err, TdlightError::Http(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_cone_and_region_search() {
    let (mock, client) = setup().await;

    let near = client.cone_search(&ConeQuery::new(10.5, -5.25, 0.5)).await.unwrap();
    let ids: Vec<_> = near.iter().map(|o| o.source_id.as_str()).collect();
    assert_eq!(ids, vec![fixtures::NEAR_CONE_ID, fixtures::LARGE_ID]);

    let cone = &mock.requests_to("/api/cone_search")[0];
    assert_eq!(cone.query_param("limit"), Some("200"));

    let north = client
        .region_search(&RegionQuery::new(40.0, 50.0, 10.0, 30.0))
        .await
        .unwrap();
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].source_id.as_str(), "123");
}

#[tokio::test]
async fn test_invalid_region_never_reaches_backend() {
    let (mock, client) = setup().await;
    let err = client
        .region_search(&RegionQuery::new(50.0, 40.0, 10.0, 30.0))
        .await
        .unwrap_err();
    assert!(matches!(err, TdlightError::InvalidInput(_)));
    assert!(mock.requests_to("/api/region_search").is_empty());
}

#[tokio::test]
async fn test_object_lookup_and_light_curve() {
    let (_mock, client) = setup().await;

    let found = client.object_by_id(fixtures::LARGE_ID).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(client.object_by_id("999").await.unwrap().is_empty());

    let table = found[0].table_name.clone().unwrap();
    let meta = client.object_metadata(&table).await.unwrap().unwrap();
    assert_eq!(meta.object_class.as_deref(), Some("EW"));

    let lc = client.fetch_light_curve(&table).await.unwrap();
    assert_eq!(lc.data.len(), 40);
    assert_eq!(lc.metadata["table_name"], table.as_str());
}

#[tokio::test]
async fn test_missing_table_is_rejected_with_backend_message() {
    let (_mock, client) = setup().await;
    match client.fetch_light_curve("sensor_data_0_0").await {
        Err(TdlightError::Rejected(msg)) => assert_eq!(msg, "Table not found"),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_databases_and_drop() {
    let (_mock, client) = setup().await;
    let list = client.list_databases().await.unwrap();
    assert_eq!(list.user_databases(), vec!["gaiadr2_lc", "ztf_dr3"]);

    client.drop_database("ztf_dr3").await.unwrap();
    let err = client.drop_database("ztf_dr3").await.unwrap_err();
    assert!(matches!(err, TdlightError::Rejected(_)));
}

#[tokio::test]
async fn test_classify_stream_delivers_scripted_events() {
    let (mock, client) = setup().await;
    mock.script(
        JobKind::Classify,
        &[
            ProgressEvent::new(20.0, "Extracting").with_step("extract"),
            ProgressEvent::new(100.0, "Done").with_step("done"),
        ],
    );

    let task_id = new_task_id();
    let mut stream = client.open_classify_stream(&task_id).await.unwrap();
    let obj = &fixtures::sample_catalog()[0];
    let started = client
        .submit_classification(&task_id, &[ClassifyTarget::from(obj)])
        .await
        .unwrap();
    assert!(started.started);
    assert_eq!(started.count, Some(1));

    let mut percents = Vec::new();
    while let Some(event) = stream.next_event().await {
        let event = event.unwrap();
        percents.push(event.percent);
        if event.percent >= 100.0 {
            break;
        }
    }
    assert_eq!(percents, vec![0.0, 20.0, 100.0]);

    let stream_req = &mock.requests_to("/api/classify_stream")[0];
    assert_eq!(stream_req.query_param("task_id"), Some(task_id.as_str()));

    let results = client.classify_results(500).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_classify_rejection_surfaces_error() {
    let (mock, client) = setup().await;
    mock.reject_start(JobKind::Classify, "model file missing");
    let err = client.submit_classification("1", &[]).await.unwrap_err();
    assert!(matches!(err, TdlightError::Rejected(ref m) if m == "model file missing"));
}

#[tokio::test]
async fn test_import_stream_starts_idle_and_stops() {
    let (_mock, client) = setup().await;
    let mut stream = client.open_import_stream().await.unwrap();
    let first = stream.next_event().await.unwrap().unwrap();
    assert!(first.is_idle());

    let request = ImportRequest {
        kind: ImportKind::Catalog,
        path: "/data/catalog".into(),
        coords_path: "/data/coords.csv".into(),
        db_name: "gaiadr2_lc".into(),
        nside: 64,
        threads: 16,
        vgroups: 32,
    };
    client.start_import(&request).await.unwrap();
    client.stop_import().await.unwrap();

    let stopped = stream.next_event().await.unwrap().unwrap();
    assert_eq!(stopped.status, Some(JobStatus::Stopped));
}

#[tokio::test]
async fn test_auto_classify_empty_queue_is_rejected() {
    let (mock, client) = setup().await;

    let check = client.check_pending("").await.unwrap();
    assert_eq!(check.db_name.as_deref(), Some("gaiadr2_lc"));
    assert_eq!(check.count, Some(0));

    let request = AutoClassifyRequest { resume: false, batch_size: 5000, db_name: String::new() };
    match client.start_auto_classify(&request).await {
        Err(TdlightError::Rejected(msg)) => assert!(msg.starts_with("Queue is empty")),
        other => panic!("unexpected {:?}", other),
    }

    mock.set_pending(12_001);
    let candidates = client.candidates("gaiadr2_lc").await.unwrap();
    assert_eq!(candidates.count, 12_001);
    let ack = client.start_auto_classify(&request).await.unwrap();
    assert_eq!(ack.count, Some(12_001));
    client.stop_auto_classify().await.unwrap();
}

#[tokio::test]
async fn test_stream_ends_when_server_hangs_up() {
    let (mock, client) = setup().await;
    mock.script_raw(
        JobKind::Import,
        vec![r#"{"percent":10,"status":"running","message":"Importing"}"#.into(), "not json".into()],
        true,
    );
    let mut stream = client.open_import_stream().await.unwrap();
    let request = ImportRequest {
        kind: ImportKind::Lightcurve,
        path: "/data/lc".into(),
        coords_path: "/data/coords.csv".into(),
        db_name: String::new(),
        nside: 64,
        threads: 16,
        vgroups: 32,
    };
    client.start_import(&request).await.unwrap();

    let mut seen = Vec::new();
    while let Some(event) = stream.next_event().await {
        seen.push(event.unwrap().percent);
    }
    assert_eq!(seen, vec![0.0, 10.0]);
    assert!(!stream.is_open());
}
