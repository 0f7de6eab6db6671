//! Tests del pipeline de flota sin pasar por HTTP

mod common;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::{device, remote_state, spawn_manifest_server, test_state, test_state_with, FakeHost};
use ruc_license_manager::cache::LocalStore;
use ruc_license_manager::clients::HostApi;
use ruc_license_manager::models::{OdometerReading, RenewalOption};
use ruc_license_manager::services::RefreshOutcome;
use ruc_license_manager::utils::errors::HostApiError;

fn manifest() -> Value {
    json!([
        { "vehicleDescription": "Isuzu FVZ", "fleetNumber": "101", "regPlate": "ABC123", "rucPaidTo": 50000 },
        { "vehicleDescription": "Hino 500", "fleetNumber": "202", "regPlate": "HNO500", "rucPaidTo": "120000" },
        { "vehicleDescription": "Trailer", "fleetNumber": 303, "regPlate": "TRL303" }
    ])
}

/// Devuelve dispositivos pero rechaza cualquier consulta de telemetría
struct TelemetryDownHost;

#[async_trait]
impl HostApi for TelemetryDownHost {
    async fn call(&self, _method: &str, params: Value) -> Result<Value, HostApiError> {
        match params["typeName"].as_str() {
            Some("Device") if params.get("search").is_none() => Ok(json!([device("b1", "101 - Truck", None)])),
            _ => Err(HostApiError::Authentication("session rejected".into())),
        }
    }
}

#[tokio::test]
async fn test_full_pipeline_mixes_known_and_missing_readings() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::with_devices(vec![
        device("b1", "101 - Truck", Some("XYZ999")),
        device("b2", "Hino", Some("HNO 500")),
    ])
    .odometer("b2", 118_500_000.0);
    let state = test_state(dir.path(), manifest(), host);

    let RefreshOutcome::Completed(summary) = state.fleet.refresh().await else {
        panic!("refresh should run");
    };
    assert_eq!(summary.total, 3);
    assert_eq!(summary.active, 1);
    assert_eq!(summary.alerts, 1);
    assert_eq!(summary.no_data, 2);

    let snapshot = state.fleet.snapshot().await;
    assert_eq!(snapshot.device_count, 2);
    assert_eq!(snapshot.vehicles[0].odometer, OdometerReading::NoData);
    assert_eq!(snapshot.vehicles[1].odometer.km(), Some(118_500));
    assert_eq!(snapshot.vehicles[1].ruc_status.as_ref().map(|s| s.remaining_km), Some(1_500));
    assert!(!snapshot.vehicles[2].has_geotab_data);
    assert_eq!(snapshot.vehicles[2].vehicle.fleet_number.as_deref(), Some("303"));
}

#[tokio::test]
async fn test_unreachable_telemetry_is_failed_not_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state_with(dir.path(), manifest(), Arc::new(TelemetryDownHost));

    state.fleet.refresh().await;
    let snapshot = state.fleet.snapshot().await;

    assert!(matches!(snapshot.vehicles[0].odometer, OdometerReading::Failed { .. }));
    assert!(snapshot.vehicles[0].ruc_status.is_none());
    assert_eq!(snapshot.summary().no_data, 3);
}

#[tokio::test]
async fn test_renewal_during_refresh_survives_swap() {
    let dir = tempfile::tempdir().unwrap();
    let host = FakeHost::with_devices(vec![device("b1", "101 - Truck", None)]).slow(Duration::from_millis(400));
    let state = test_state(dir.path(), manifest(), host);
    state.fleet.refresh().await;

    let background = state.clone();
    let running = tokio::spawn(async move { background.fleet.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.fleet.is_refreshing());

    let (record, _) = state.fleet.renew("ABC123", RenewalOption::Km1000).await.unwrap();
    assert_eq!(record.new_total, 51_000);

    assert!(matches!(running.await.unwrap(), RefreshOutcome::Completed(_)));
    let snapshot = state.fleet.snapshot().await;
    assert_eq!(snapshot.find("ABC123").and_then(|v| v.vehicle.ruc_paid_to), Some(51_000));
    assert_eq!(snapshot.renewal_history["ABC123"].len(), 1);
}

#[tokio::test]
async fn test_cached_list_used_when_manifest_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), manifest(), FakeHost::default());
    state.fleet.refresh().await;
    state.fleet.renew("HNO500", RenewalOption::Km10000).await.unwrap();

    std::fs::remove_file(dir.path().join("RUC_Data.json")).unwrap();
    state.fleet.refresh().await;

    let snapshot = state.fleet.snapshot().await;
    assert_eq!(snapshot.vehicles.len(), 3);
    assert!(matches!(
        snapshot.origin,
        Some(ruc_license_manager::services::manifest_service::DataOrigin::Cache { .. })
    ));
    assert_eq!(snapshot.find("HNO500").and_then(|v| v.vehicle.ruc_paid_to), Some(130_000));
}

#[tokio::test]
async fn test_renewal_during_slow_manifest_fetch_stays_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_manifest_server(manifest(), Duration::from_millis(400)).await;
    let state = remote_state(dir.path(), &url, FakeHost::default());
    state.fleet.refresh().await;

    let background = state.clone();
    let running = tokio::spawn(async move { background.fleet.refresh().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    state.fleet.renew("ABC123", RenewalOption::Km5000).await.unwrap();
    assert!(matches!(running.await.unwrap(), RefreshOutcome::Completed(_)));

    let snapshot = state.fleet.snapshot().await;
    assert_eq!(snapshot.find("ABC123").and_then(|v| v.vehicle.ruc_paid_to), Some(55_000));

    let saved = LocalStore::new(dir.path().join("store")).load_vehicles().await.unwrap().unwrap();
    let abc = saved.iter().find(|v| v.reg_plate.as_deref() == Some("ABC123")).unwrap();
    assert_eq!(abc.ruc_paid_to, Some(55_000));

    // Reinicio: el manifiesto sigue diciendo 50,000
    let restarted = remote_state(dir.path(), &url, FakeHost::default());
    restarted.fleet.refresh().await;
    let snapshot = restarted.fleet.snapshot().await;
    assert_eq!(snapshot.find("ABC123").and_then(|v| v.vehicle.ruc_paid_to), Some(55_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_renewals_all_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), manifest(), FakeHost::default());
    state.fleet.refresh().await;

    let renewals = (0..40).map(|_| {
        let state = state.clone();
        tokio::spawn(async move { state.fleet.renew("ABC123", RenewalOption::Km1000).await })
    });
    for result in futures::future::join_all(renewals).await {
        result.unwrap().unwrap();
    }

    let store = LocalStore::new(dir.path().join("store"));
    let history = store.load_renewal_history().await.unwrap();
    assert_eq!(history["ABC123"].len(), 40);

    let saved = store.load_vehicles().await.unwrap().unwrap();
    let abc = saved.iter().find(|v| v.reg_plate.as_deref() == Some("ABC123")).unwrap();
    assert_eq!(abc.ruc_paid_to, Some(90_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_polling_never_blocks_a_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), manifest(), FakeHost::default());

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let poller = {
        let state = state.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                let _ = state.fleet.is_refreshing();
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..25 {
        assert!(matches!(state.fleet.refresh().await, RefreshOutcome::Completed(_)));
    }
    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    poller.await.unwrap();
    assert!(!state.fleet.is_refreshing());
}
