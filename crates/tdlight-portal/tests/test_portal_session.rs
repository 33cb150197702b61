//! Session behaviour of the portal controller against the mock backend.

use pretty_assertions::assert_eq;
use tdlight_common::SourceId;
use tdlight_config::Settings;
use tdlight_portal::{NoticeKind, NoticeLevel, Portal, SearchMode};
use tdlight_test_utils::{fixtures, unreachable_base_url, MockBackend};

fn settings(base_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.backend.base_url = base_url.to_string();
    settings.classification.results_delay_ms = 0;
    settings
}

async fn setup() -> (MockBackend, Portal) {
    let mock = MockBackend::start().await.unwrap();
    let portal = Portal::from_settings(settings(&mock.base_url())).unwrap();
    (mock, portal)
}

fn last_kind(portal: &Portal) -> NoticeKind {
    portal.state().last_notice().unwrap().kind.clone()
}

// ── Searching ───────────────────────────────────────────────

#[tokio::test]
async fn test_append_searches_never_duplicate_ids() {
    let (_mock, mut portal) = setup().await;

    assert_eq!(portal.cone_search(10.5, -5.25, 0.5, SearchMode::Append).await, 2);
    assert_eq!(portal.cone_search(10.5, -5.25, 0.5, SearchMode::Append).await, 0);
    assert_eq!(last_kind(&portal), NoticeKind::AllAlreadyListed);

    assert_eq!(portal.region_search(0.0, 50.0, -10.0, 30.0, SearchMode::Append).await, 1);
    assert_eq!(portal.search_ids(fixtures::NEAR_CONE_ID, SearchMode::Append).await, 0);

    let mut ids: Vec<_> = portal
        .state()
        .selection
        .objects()
        .map(|o| o.source_id.as_str().to_string())
        .collect();
    let listed = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), listed);
    assert_eq!(listed, 3);
}

#[tokio::test]
async fn test_replace_cone_search_remembers_cone() {
    let (mock, mut portal) = setup().await;

    portal.cone_search(10.5, -5.25, 0.5, SearchMode::Replace).await;
    assert_eq!(last_kind(&portal), NoticeKind::ObjectsFound { count: 2 });
    assert!(portal.state().cone.is_some());

    let cone = &mock.requests_to("/api/cone_search")[0];
    assert_eq!(cone.query_param("limit"), Some("200"));

    portal.region_search(40.0, 50.0, 10.0, 30.0, SearchMode::Replace).await;
    assert!(portal.state().cone.is_none());
    assert_eq!(portal.state().selection.len(), 1);
}

#[tokio::test]
async fn test_invalid_region_is_rejected_locally() {
    let (mock, mut portal) = setup().await;
    assert_eq!(portal.region_search(50.0, 40.0, 10.0, 30.0, SearchMode::Replace).await, 0);
    assert!(matches!(last_kind(&portal), NoticeKind::InvalidSearchInput(_)));
    assert!(mock.requests_to("/api/region_search").is_empty());
}

#[tokio::test]
async fn test_empty_result_is_reported() {
    let (_mock, mut portal) = setup().await;
    portal.cone_search(300.0, 80.0, 0.1, SearchMode::Replace).await;
    assert_eq!(last_kind(&portal), NoticeKind::NothingFound);
    assert_eq!(portal.state().last_notice().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_id_search_highlights_first_hit() {
    let (mock, mut portal) = setup().await;

    let added = portal.search_ids("123\n\n  999 \n", SearchMode::Replace).await;
    assert_eq!(added, 1);
    assert_eq!(mock.requests_to("/api/object_by_id").len(), 2);
    assert_eq!(portal.state().highlighted, Some(SourceId::new("123")));
    assert_eq!(portal.state().light_curve.as_ref().map(|c| c.points.len()), Some(40));
}

#[tokio::test]
async fn test_blank_id_input_sends_nothing() {
    let (mock, mut portal) = setup().await;
    portal.search_ids(" \n \n", SearchMode::Replace).await;
    assert_eq!(last_kind(&portal), NoticeKind::NoIdsEntered);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_select_all_toggles_submit() {
    let (_mock, mut portal) = setup().await;
    portal.cone_search(10.5, -5.25, 0.5, SearchMode::Replace).await;

    let selection = &mut portal.state_mut().selection;
    selection.select_all(true);
    assert_eq!(selection.enabled_count(), 2);
    selection.select_all(false);
    assert_eq!(selection.enabled_count(), 0);
    assert!(!selection.can_submit());
}

// ── Viewing ─────────────────────────────────────────────────

#[tokio::test]
async fn test_view_object_loads_light_curve() {
    let (mock, mut portal) = setup().await;
    portal.cone_search(10.5, -5.25, 0.5, SearchMode::Replace).await;

    assert!(portal.view_object(fixtures::LARGE_ID).await);
    let state = portal.state();
    assert_eq!(state.highlighted.as_ref().map(SourceId::as_str), Some(fixtures::LARGE_ID));
    assert_eq!(state.light_curve.as_ref().map(|c| c.points.len()), Some(40));
    assert_eq!(
        state.highlighted_object().and_then(|o| o.object_class.as_deref()),
        Some("EW")
    );

    let table = fixtures::table_for("1001", fixtures::LARGE_ID);
    assert!(mock.position_of(&format!("/api/object/{}", table)) < mock.position_of(&format!("/api/lightcurve/{}", table)));
}

#[tokio::test]
async fn test_open_object_fetches_light_curve_once() {
    let (mock, mut portal) = setup().await;

    assert!(portal.open_object(" 123 ").await);
    let state = portal.state();
    assert_eq!(state.selection.len(), 1);
    assert_eq!(state.highlighted, Some(SourceId::new("123")));
    assert_eq!(state.light_curve.as_ref().map(|c| c.points.len()), Some(40));

    let table = fixtures::table_for("2042", "123");
    assert_eq!(mock.requests_to(&format!("/api/lightcurve/{}", table)).len(), 1);
    assert!(mock.requests_to(&format!("/api/object/{}", table)).is_empty());
}

#[tokio::test]
async fn test_open_unknown_object_fails() {
    let (mock, mut portal) = setup().await;
    assert!(!portal.open_object("999").await);
    assert_eq!(last_kind(&portal), NoticeKind::NothingFound);
    assert!(mock.requests().iter().all(|r| !r.path.starts_with("/api/lightcurve")));
}

#[tokio::test]
async fn test_view_unlisted_object_is_reported() {
    let (mock, mut portal) = setup().await;
    assert!(!portal.view_object("42").await);
    assert_eq!(last_kind(&portal), NoticeKind::ObjectUnavailable);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_pick_on_sky_map_selects_nearest() {
    let (_mock, mut portal) = setup().await;
    portal.cone_search(10.5, -5.25, 0.5, SearchMode::Replace).await;

    let viewport = portal.viewport(800.0, 480.0).unwrap();
    let (x, y) = viewport.project(10.5, -5.25);
    let picked = portal.pick_at(800.0, 480.0, x + 3.0, y).await;

    assert_eq!(picked.as_ref().map(SourceId::as_str), Some(fixtures::NEAR_CONE_ID));
    assert!(portal.state().light_curve.is_some());
    assert_eq!(portal.pick_at(800.0, 480.0, 1.0, 1.0).await, None);
}

// ── Configuration ───────────────────────────────────────────

#[tokio::test]
async fn test_config_load_failure_keeps_form() {
    let url = unreachable_base_url().await.unwrap();
    let mut portal = Portal::from_settings(settings(&url)).unwrap();
    portal.state_mut().config_form.db_name = "my_db".into();
    portal.state_mut().config_form.db_port = "6030".into();
    let before = portal.state().config_form.clone();

    assert!(!portal.load_config().await);
    assert_eq!(portal.state().config_form, before);
    let notice = portal.state().last_notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(matches!(notice.kind, NoticeKind::ConfigLoadFailed(_)));
}

#[tokio::test]
async fn test_config_load_fills_form_and_databases() {
    let (_mock, mut portal) = setup().await;
    assert!(portal.load_config().await);

    let form = &portal.state().config_form;
    assert_eq!(form.db_name, "gaiadr2_lc");
    assert_eq!(form.db_port, "6030");
    assert_eq!(form.threads, "16");
    assert_eq!(form.threshold, "0.95");
    assert_eq!(portal.state().databases, vec!["gaiadr2_lc", "ztf_dr3"]);
    assert_eq!(portal.state().current_database.as_deref(), Some("gaiadr2_lc"));
}

#[tokio::test]
async fn test_save_coerces_form_numbers() {
    let (mock, mut portal) = setup().await;
    {
        let form = &mut portal.state_mut().config_form;
        form.db_name = "ztf_dr3".into();
        form.db_port = "not a port".into();
        form.threads = "8 threads".into();
        form.threshold = "0".into();
    }
    assert!(portal.save_config().await);

    let body = mock.requests_to("/api/config").last().unwrap().body.clone().unwrap();
    assert_eq!(body["db_port"], 6041);
    assert_eq!(body["threads"], 8);
    assert_eq!(body["vgroups"], 32);
    assert_eq!(body["confidence_threshold"], 0.95);
}

#[tokio::test]
async fn test_apply_saves_without_import_settings_then_reloads() {
    let (mock, mut portal) = setup().await;
    assert!(portal.apply_config().await);

    let body = mock.requests_to("/api/config").last().unwrap().body.clone().unwrap();
    assert!(body.get("threads").is_none());
    assert!(body.get("vgroups").is_none());
    assert!(mock.position_of("/api/config") < mock.position_of("/api/config/reload"));
    assert_eq!(last_kind(&portal), NoticeKind::ConfigApplied);
}

#[tokio::test]
async fn test_sync_copies_database_and_nside() {
    let (mock, mut portal) = setup().await;
    portal.state_mut().import_form.nside = "16".into();

    assert!(portal.sync_config_from_file().await);
    assert_eq!(portal.state().import_form.db_name, "gaiadr2_lc");
    assert_eq!(portal.state().import_form.nside, "64");
    // Only the existing queue is read, no rescan.
    assert!(mock.requests_to("/api/auto_classify/check").is_empty());
    assert_eq!(mock.requests_to("/api/auto_classify/candidates").len(), 1);
}

#[tokio::test]
async fn test_init_seeds_import_database_once() {
    let (_mock, mut portal) = setup().await;
    portal.init().await;
    assert_eq!(portal.state().import_form.db_name, "gaiadr2_lc");

    portal.state_mut().import_form.db_name = "ztf_dr3".into();
    portal.init().await;
    assert_eq!(portal.state().import_form.db_name, "ztf_dr3");
}

// ── Databases ───────────────────────────────────────────────

#[tokio::test]
async fn test_drop_database_refreshes_list() {
    let (mock, mut portal) = setup().await;

    assert!(!portal.drop_database("  ").await);
    assert_eq!(last_kind(&portal), NoticeKind::NoDatabaseChosen);
    assert!(mock.requests_to("/api/database/drop").is_empty());

    assert!(portal.drop_database("ztf_dr3").await);
    assert_eq!(portal.state().databases, vec!["gaiadr2_lc"]);

    assert!(!portal.drop_database("ztf_dr3").await);
    assert!(matches!(last_kind(&portal), NoticeKind::DatabaseDropFailed(_)));
}

// ── Export ──────────────────────────────────────────────────

#[tokio::test]
async fn test_export_of_empty_list_writes_nothing() {
    let (_mock, mut portal) = setup().await;
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(portal.export_object_list(dir.path()), None);
    assert_eq!(last_kind(&portal), NoticeKind::ExportEmpty);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    assert_eq!(portal.export_light_curve(dir.path()), None);
    assert_eq!(last_kind(&portal), NoticeKind::ExportNoLightCurve);
}

#[tokio::test]
async fn test_export_writes_list_and_light_curve() {
    let (_mock, mut portal) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    portal.cone_search(10.5, -5.25, 0.5, SearchMode::Replace).await;
    portal.view_object(fixtures::NEAR_CONE_ID).await;

    let list = portal.export_object_list(dir.path()).unwrap();
    let text = std::fs::read_to_string(&list).unwrap();
    assert!(text.starts_with("source_id,ra,dec,healpix_id,object_class,band\n"));
    assert!(text.contains("6917528997577384320,10.6,-5.3,1001,EW,G"));
    assert_eq!(text.lines().count(), 3);

    let curve = portal.export_light_curve(dir.path()).unwrap();
    assert_eq!(
        curve.file_name().and_then(|n| n.to_str()),
        Some("lightcurve_4295806720.csv")
    );
    assert_eq!(std::fs::read_to_string(&curve).unwrap().lines().count(), 41);
}

#[tokio::test]
async fn test_notices_are_broadcast() {
    let (_mock, mut portal) = setup().await;
    let mut rx = portal.subscribe();
    portal.clear_objects();
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::ListCleared);
}
