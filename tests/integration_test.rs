//! Integration tests for the happymap server
//!
//! These tests start the API on an ephemeral port and exercise it over HTTP,
//! including the viewer driving a render pass through the HTTP data source.

mod common;

use common::{assertions, http_client, test_data};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::net::SocketAddr;
use std::sync::Arc;

use happymap::fetch::{DataSource, HttpDataSource};
use happymap::metrics::{GREEN, RED};
use happymap::render::RecordingSurface;
use happymap::viewer::{MapViewer, UpdateOutcome, View};
use happymap::{ColorStrategy, HappyMapError, MetricId, MetricRegistry};

/// Start a test server on an ephemeral port; the temp dir must outlive it
async fn start_test_server() -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_data::fixture_config(dir.path()).expect("Failed to write fixtures");

    let app_state =
        happymap::data_loader::load_dataset(config).expect("Failed to load test dataset");
    let app = happymap::handlers::router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("Failed to bind test port");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    (addr, dir)
}

#[tokio::test]
async fn test_years_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let years: Vec<i32> = http_client::get_json(&addr, "/api/years").await.unwrap();
    assert_eq!(years, vec![2020, 2021]);
}

#[tokio::test]
async fn test_country_endpoints() {
    let (addr, _dir) = start_test_server().await;

    let countries: Vec<String> = http_client::get_json(&addr, "/api/country").await.unwrap();
    assert_eq!(countries, vec!["Chad".to_string(), "Finland".to_string()]);

    let locations: serde_json::Value = http_client::get_json(&addr, "/api/country/location")
        .await
        .unwrap();
    assert_eq!(locations["Chad"], serde_json::json!([15.454166, 18.732207]));

    let finland: serde_json::Value = http_client::get_json(&addr, "/api/country/Finland/location")
        .await
        .unwrap();
    assert_eq!(finland["latitude"], serde_json::json!(61.92411));

    let response = http_client::get(&addr, "/api/country/Atlantis/location")
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn test_table_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let rows: Vec<serde_json::Value> = http_client::get_json(&addr, "/api/table/year/2020")
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["Country name"], "Finland");
    assert_eq!(rows[0]["Life Ladder"], serde_json::json!(7.8));
    assert!(rows[1]["Perceptions of corruption"].is_null());

    let empty: Vec<serde_json::Value> = http_client::get_json(&addr, "/api/table/year/1999")
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let metrics: Vec<serde_json::Value> =
        http_client::get_json(&addr, "/api/metrics").await.unwrap();
    assert_eq!(metrics.len(), 9);
    assert_eq!(metrics[0]["id"], "happiness");
    assert_eq!(metrics[0]["field_name"], "Life Ladder");
    assert_eq!(metrics[0]["control_points"][0]["color"], "#2ECC71");
    assert_eq!(metrics[6]["polarity"], "lower_is_better");
}

#[tokio::test]
async fn test_markers_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let body: serde_json::Value =
        http_client::get_json(&addr, "/api/markers?year=2020&metric=happiness&policy=banded")
            .await
            .unwrap();
    let markers = body["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 2);
    assert_eq!(body["policy"], "banded");
    assert_eq!(markers[0]["country"], "Finland");
    assertions::assert_marker_color(&markers[0], GREEN);
    assertions::assert_marker_color(&markers[1], RED);
    assert_eq!(body["summary"]["missing_coordinates"], serde_json::json!(["Atlantis"]));

    // Corruption: Chad has no value, Finland's low score is good
    let body: serde_json::Value = http_client::get_json(
        &addr,
        "/api/markers?year=2020&metric=corruption&policy=banded",
    )
    .await
    .unwrap();
    let markers = body["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assertions::assert_marker_color(&markers[0], GREEN);
    assert_eq!(body["summary"]["missing_values"], serde_json::json!(["Chad"]));
    assert_eq!(body["policy"], "banded");

    let response = http_client::get(&addr, "/api/markers?year=2020&metric=wealth")
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = http_client::get(&addr, "/api/markers?year=2020&policy=smooth")
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_heartbeat_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let heartbeat: serde_json::Value = http_client::get_json(&addr, "/heartbeat").await.unwrap();
    assert_eq!(heartbeat["status"], "healthy");
    assert_eq!(heartbeat["dataset"]["row_count"], 5);
    assert_eq!(heartbeat["dataset"]["metric_count"], 9);
}

#[tokio::test]
async fn test_http_source_round_trip() {
    let (addr, _dir) = start_test_server().await;
    let source = HttpDataSource::new(format!("http://{}/api", addr)).unwrap();

    assert_eq!(source.fetch_years().await.unwrap(), vec![2020, 2021]);
    let rows = source.fetch_table_for_year(2021).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].value("Perceptions of corruption"), Some(0.8));
    let coordinates = source.fetch_country_coordinates().await.unwrap();
    assert_eq!(coordinates.len(), 2);

    let bad = HttpDataSource::new(format!("http://{}/nothing", addr)).unwrap();
    let err = bad.fetch_years().await.unwrap_err();
    assert!(matches!(err, HappyMapError::Fetch { .. }));
}

#[tokio::test]
async fn test_viewer_over_http() {
    let (addr, _dir) = start_test_server().await;
    let source: Arc<dyn DataSource> =
        Arc::new(HttpDataSource::new(format!("http://{}/api", addr)).unwrap());
    let viewer = MapViewer::new(
        Arc::new(MetricRegistry::builtin().unwrap()),
        source,
        Arc::new(Mutex::new(RecordingSurface::new())),
        ColorStrategy::Banded,
    );

    viewer.start().await.unwrap();
    {
        let surface = viewer.surface().lock();
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(surface.markers().len(), 2);
        assert_eq!(surface.markers()[0].color, GREEN);
        assert_eq!(surface.markers()[1].color, RED);
    }

    // Chad's 2021 corruption score is high, so it turns red under corruption
    let outcome = viewer
        .update(View {
            year: 2021,
            metric: MetricId::Corruption,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, UpdateOutcome::Applied(_)));
    let surface = viewer.surface().lock();
    assert_eq!(surface.clear_count(), 2);
    let chad = surface
        .markers()
        .iter()
        .find(|m| m.country == "Chad")
        .unwrap();
    assert_eq!(chad.color, RED);
    let finland = surface
        .markers()
        .iter()
        .find(|m| m.country == "Finland")
        .unwrap();
    assert_eq!(finland.color, GREEN);
}
