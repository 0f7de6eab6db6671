//! Tests de integración de la API HTTP

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

use common::{body_json, body_text, device, get, post, post_json, test_state, FakeHost};
use ruc_license_manager::create_router;

fn single_truck_manifest() -> serde_json::Value {
    json!([{
        "vehicleDescription": "Isuzu FVZ",
        "fleetNumber": "101",
        "regPlate": "ABC123",
        "rucPaidTo": 50000
    }])
}

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), json!([]), FakeHost::default());

    let response = create_router(state).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "ruc_license_manager");
}

#[tokio::test]
async fn test_matched_vehicle_without_telemetry_shows_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::with_devices(vec![device("b1", "101 - Truck", Some("XYZ999"))]);
    let state = test_state(dir.path(), single_truck_manifest(), host);

    let response = create_router(state.clone()).oneshot(post("/api/addin/initialize")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "active");
    assert_eq!(json["data"]["reloaded"], true);

    let response = create_router(state.clone()).oneshot(get("/api/fleet")).await.unwrap();
    let json = body_json(response).await;
    let row = &json["vehicles"][0];
    assert_eq!(json["statusMessage"], "Connected - 1 vehicles loaded");
    assert_eq!(row["hasGeotabData"], true);
    assert_eq!(row["matchStrategy"], "fleetNumberInName");
    assert_eq!(row["deviceName"], "101 - Truck");
    assert_eq!(row["remainingDisplay"], "NO ODOMETER DATA");
    assert_eq!(row["statusLabel"], "No Data");
    assert_eq!(row["odometer"]["state"], "noData");
    assert_eq!(json["summary"]["total"], 1);
    assert_eq!(json["summary"]["noData"], 1);

    let response = create_router(state).oneshot(get("/api/fleet/table")).await.unwrap();
    let html = body_text(response).await;
    assert!(html.contains("NO ODOMETER DATA"));
    assert!(html.contains("No Data"));
}

#[tokio::test]
async fn test_known_odometer_raises_warning_alert() {
    let dir = tempfile::tempdir().unwrap();
    // 48,500 km reportados en metros
    let host = FakeHost::with_devices(vec![device("b1", "Truck", Some("ABC-123"))]).odometer("b1", 48_500_000.0);
    let state = test_state(dir.path(), single_truck_manifest(), host);

    state.fleet.refresh().await;

    let json = body_json(create_router(state.clone()).oneshot(get("/api/fleet")).await.unwrap()).await;
    let row = &json["vehicles"][0];
    assert_eq!(row["matchStrategy"], "normalizedPlate");
    assert_eq!(row["currentOdometer"], 48_500);
    assert_eq!(row["remainingDisplay"], "1,500 km remaining");
    assert_eq!(row["status"]["kind"], "warning");
    assert_eq!(json["summary"]["alerts"], 1);
    assert_eq!(json["summary"]["active"], 1);

    let alerts = body_json(create_router(state).oneshot(get("/api/fleet/alerts")).await.unwrap()).await;
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["urgency"], "WARNING");
    assert_eq!(alerts[0]["remainingKm"], 1_500);
}

#[tokio::test]
async fn test_renewal_persists_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), single_truck_manifest(), FakeHost::default());
    state.fleet.refresh().await;

    let response = create_router(state.clone())
        .oneshot(post_json("/api/fleet/vehicles/ABC123/renewals", json!({ "km": 5000 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["record"]["kmAdded"], 5000);
    assert_eq!(json["data"]["record"]["newTotal"], 55_000);
    assert_eq!(json["data"]["record"]["cost"], "380.00");
    assert_eq!(json["data"]["vehicle"]["rucPaidTo"], 55_000);

    // Nuevo proceso: el manifiesto sigue diciendo 50,000
    let reloaded = test_state(dir.path(), single_truck_manifest(), FakeHost::default());
    reloaded.fleet.refresh().await;

    let json = body_json(create_router(reloaded.clone()).oneshot(get("/api/fleet")).await.unwrap()).await;
    assert_eq!(json["vehicles"][0]["rucPaidTo"], 55_000);

    let history = body_json(
        create_router(reloaded)
            .oneshot(get("/api/fleet/vehicles/ABC123/renewals"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["newTotal"], 55_000);
}

#[tokio::test]
async fn test_renewal_quote_lists_menu() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), single_truck_manifest(), FakeHost::default());
    state.fleet.refresh().await;

    let response = create_router(state)
        .oneshot(get("/api/fleet/vehicles/101/renewal-quote"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let totals: Vec<u64> = json["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["newTotal"].as_u64().unwrap())
        .collect();
    assert_eq!(totals, vec![51_000, 55_000, 60_000]);
}

#[tokio::test]
async fn test_invalid_renewals_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), single_truck_manifest(), FakeHost::default());
    state.fleet.refresh().await;

    for body in [json!({ "km": 2500 }), json!({ "km": 500 }), json!({ "km": "lots" })] {
        let response = create_router(state.clone())
            .oneshot(post_json("/api/fleet/vehicles/ABC123/renewals", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = create_router(state.clone())
        .oneshot(post_json("/api/fleet/vehicles/NOPE99/renewals", json!({ "km": 1000 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nada cambió
    let json = body_json(create_router(state).oneshot(get("/api/fleet")).await.unwrap()).await;
    assert_eq!(json["vehicles"][0]["rucPaidTo"], 50_000);
}

#[tokio::test]
async fn test_focus_before_initialize_is_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), single_truck_manifest(), FakeHost::default());

    let response = create_router(state.clone()).oneshot(post("/api/addin/focus")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    create_router(state.clone()).oneshot(post("/api/addin/initialize")).await.unwrap();
    let response = create_router(state.clone()).oneshot(post("/api/addin/blur")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "backgrounded");
    assert_eq!(json["data"]["reloaded"], false);

    let response = create_router(state.clone()).oneshot(post("/api/addin/focus")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(create_router(state).oneshot(get("/api/addin/state")).await.unwrap()).await;
    assert_eq!(json["state"], "active");
    assert_eq!(json["summary"]["total"], 1);
}

#[tokio::test]
async fn test_concurrent_refresh_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::with_devices(vec![device("b1", "101 - Truck", None)]).slow(Duration::from_millis(500));
    let state = test_state(dir.path(), single_truck_manifest(), host);

    let background = state.clone();
    let running = tokio::spawn(async move { background.fleet.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = create_router(state.clone()).oneshot(post("/api/fleet/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    running.await.unwrap();
    let response = create_router(state).oneshot(post("/api/fleet/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_manifest_without_cache_shows_banner() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), json!([]), FakeHost::default());
    std::fs::remove_file(dir.path().join("RUC_Data.json")).unwrap();

    state.fleet.refresh().await;

    let json = body_json(create_router(state.clone()).oneshot(get("/api/fleet")).await.unwrap()).await;
    assert_eq!(json["statusMessage"], "Error loading RUC data");
    assert!(json["errorBanner"].as_str().unwrap().starts_with("Error loading RUC data"));
    assert_eq!(json["vehicles"].as_array().unwrap().len(), 0);

    let html = body_text(create_router(state).oneshot(get("/api/fleet/table")).await.unwrap()).await;
    assert!(html.contains("class=\"banner\""));
}

#[tokio::test]
async fn test_odometer_refresh_requires_matched_device() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), single_truck_manifest(), FakeHost::default());
    state.fleet.refresh().await;

    let response = create_router(state)
        .oneshot(post("/api/fleet/vehicles/ABC123/odometer"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
