//! Servicio de flota RUC
//!
//! Orquesta el pipeline completo: manifiesto (o cache), dispositivos del
//! host, emparejamiento, odómetros y estado. El resultado se publica como
//! un snapshot inmutable que se reemplaza de una sola vez al terminar.
//!
//! Solo un refresco corre a la vez. Las renovaciones pueden llegar durante
//! un refresco; al publicar el nuevo snapshot se conserva el límite pagado
//! más alto de cada vehículo para que no se pierdan.
//!
//! Las escrituras a disco toman `persist_lock` antes de soltar el snapshot,
//! así llegan al disco en el mismo orden en que cambió la memoria.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{info, warn};

use crate::cache::local_store::{load_history_or_empty, LocalStore};
use crate::clients::{HostApi, HostGateway};
use crate::config::{EnvironmentConfig, RucThresholds};
use crate::models::{
    normalize_plate, Device, MatchedVehicle, OdometerReading, RenewalHistory, RenewalOption, RenewalQuote,
    RenewalRecord, RucVehicle,
};
use crate::services::manifest_service::{load_working_list, DataOrigin, ManifestLoader, ManifestSource};
use crate::services::matching_service::match_vehicles;
use crate::services::odometer_service::OdometerResolver;
use crate::services::renewal_service;
use crate::services::status_service::{status_for, summarize, FleetSummary};
use crate::utils::errors::{bad_request_error, not_found_error, AppResult};

/// Estado publicado de la flota
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    pub vehicles: Vec<MatchedVehicle>,
    pub renewal_history: RenewalHistory,
    pub origin: Option<DataOrigin>,
    pub device_count: usize,
    pub host_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub(crate) history_loaded: bool,
}

impl FleetSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.last_updated.is_some()
    }

    pub fn find(&self, key: &str) -> Option<&MatchedVehicle> {
        self.vehicles.iter().find(|v| v.vehicle.matches_key(key))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.vehicles.iter().position(|v| v.vehicle.matches_key(key))
    }

    pub fn summary(&self) -> FleetSummary {
        summarize(&self.vehicles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(FleetSummary),
    AlreadyRunning,
}

#[derive(Clone)]
pub struct FleetService {
    gateway: HostGateway,
    resolver: OdometerResolver,
    loader: ManifestLoader,
    store: LocalStore,
    thresholds: RucThresholds,
    rate_per_km: Decimal,
    concurrency: usize,
    snapshot: Arc<RwLock<FleetSnapshot>>,
    refreshing: Arc<AtomicBool>,
    persist_lock: Arc<Mutex<()>>,
}

/// Marca de refresco en curso; se libera aunque el futuro se cancele
struct RefreshGuard(Arc<AtomicBool>);

impl RefreshGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FleetService {
    pub fn new(config: &EnvironmentConfig, api: Arc<dyn HostApi>) -> AppResult<Self> {
        let gateway = HostGateway::new(api, config.host_call_timeout);
        let loader = ManifestLoader::new(ManifestSource::parse(&config.manifest_url), config.manifest_timeout)?;

        Ok(Self {
            resolver: OdometerResolver::new(gateway.clone()),
            gateway,
            loader,
            store: LocalStore::new(config.data_dir.clone()),
            thresholds: config.thresholds,
            rate_per_km: config.ruc_rate_per_km,
            concurrency: config.odometer_concurrency.max(1),
            snapshot: Arc::new(RwLock::new(FleetSnapshot::default())),
            refreshing: Arc::new(AtomicBool::new(false)),
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn thresholds(&self) -> &RucThresholds {
        &self.thresholds
    }

    pub async fn snapshot(&self) -> FleetSnapshot {
        self.snapshot.read().await.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Pipeline completo. Si ya hay uno en curso no se encola otro.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            info!("⏭️ Refresco ya en curso, se omite");
            return RefreshOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        info!("🔄 Iniciando refresco de la flota RUC");

        let loaded = load_working_list(&self.loader, &self.store).await;

        let (devices, host_error) = match self.gateway.get_devices().await {
            Ok(devices) => (devices, None),
            Err(e) => {
                warn!("⚠️ No se pudieron obtener los dispositivos del host: {}", e);
                (Vec::<Device>::new(), Some(e.to_string()))
            }
        };

        let mut vehicles = match_vehicles(&loaded.vehicles, &devices);
        self.resolve_odometers(&mut vehicles).await;

        let history = if self.snapshot.read().await.history_loaded {
            None
        } else {
            Some(load_history_or_empty(&self.store).await)
        };

        let from_manifest = loaded.origin == DataOrigin::Manifest;
        let (summary, pending_save) = {
            let mut snapshot = self.snapshot.write().await;
            carry_forward_paid_to(&mut vehicles, &snapshot.vehicles);
            for vehicle in vehicles.iter_mut() {
                vehicle.ruc_status = status_for(&self.thresholds, vehicle);
            }

            if let Some(history) = history {
                if !snapshot.history_loaded {
                    snapshot.renewal_history = history;
                    snapshot.history_loaded = true;
                }
            }
            snapshot.vehicles = vehicles;
            snapshot.origin = Some(loaded.origin);
            snapshot.device_count = devices.len();
            snapshot.host_error = host_error;
            snapshot.last_updated = Some(Utc::now());

            let pending_save = if from_manifest {
                let working_list: Vec<RucVehicle> = snapshot.vehicles.iter().map(|v| v.vehicle.clone()).collect();
                Some((working_list, self.persist_lock.clone().lock_owned().await))
            } else {
                None
            };
            (snapshot.summary(), pending_save)
        };

        if let Some((working_list, _persist)) = pending_save {
            if let Err(e) = self.store.save_vehicles(&working_list).await {
                warn!("⚠️ No se pudo guardar la cache de vehículos, se sigue en memoria: {}", e);
            }
        }

        info!(
            "✅ Refresco completado en {:?}: {} vehículos, {} alertas, {} sin datos",
            started.elapsed(),
            summary.total,
            summary.alerts,
            summary.no_data
        );
        RefreshOutcome::Completed(summary)
    }

    /// Resolver odómetros en lotes concurrentes
    async fn resolve_odometers(&self, vehicles: &mut [MatchedVehicle]) {
        for chunk in vehicles.chunks_mut(self.concurrency) {
            let readings = join_all(chunk.iter().map(|vehicle| {
                let resolver = self.resolver.clone();
                let device_id = vehicle.device_id().map(str::to_string);
                async move {
                    match device_id {
                        Some(id) => resolver.resolve(&id).await,
                        None => OdometerReading::NoData,
                    }
                }
            }))
            .await;

            for (vehicle, reading) in chunk.iter_mut().zip(readings) {
                vehicle.odometer = reading;
            }
        }
    }

    /// Volver a leer el odómetro de un solo vehículo
    pub async fn refresh_vehicle_odometer(&self, key: &str) -> AppResult<MatchedVehicle> {
        let device_id = {
            let snapshot = self.snapshot.read().await;
            let vehicle = snapshot.find(key).ok_or_else(|| not_found_error("Vehicle", key))?;
            vehicle
                .device_id()
                .map(str::to_string)
                .ok_or_else(|| bad_request_error(format!("Vehicle {} has no matched device", key)))?
        };

        let reading = self.resolver.resolve(&device_id).await;

        let mut snapshot = self.snapshot.write().await;
        let index = snapshot.position(key).ok_or_else(|| not_found_error("Vehicle", key))?;
        let vehicle = &mut snapshot.vehicles[index];
        vehicle.odometer = reading;
        vehicle.ruc_status = status_for(&self.thresholds, vehicle);
        Ok(vehicle.clone())
    }

    pub async fn quote_renewal(&self, key: &str) -> AppResult<Vec<RenewalQuote>> {
        let snapshot = self.snapshot.read().await;
        let vehicle = snapshot.find(key).ok_or_else(|| not_found_error("Vehicle", key))?;
        Ok(renewal_service::quote(&vehicle.vehicle, self.rate_per_km))
    }

    /// Aplicar una renovación y persistir lista e historial.
    /// Un fallo de escritura no deshace la renovación en memoria.
    pub async fn renew(&self, key: &str, option: RenewalOption) -> AppResult<(RenewalRecord, MatchedVehicle)> {
        let (record, updated, history, working_list, _persist) = {
            let mut snapshot = self.snapshot.write().await;
            let index = snapshot.position(key).ok_or_else(|| not_found_error("Vehicle", key))?;

            let vehicle = &mut snapshot.vehicles[index];
            let record = renewal_service::apply_renewal(&mut vehicle.vehicle, option, self.rate_per_km, Utc::now());
            vehicle.ruc_status = status_for(&self.thresholds, vehicle);
            let updated = vehicle.clone();

            renewal_service::record_in_history(
                &mut snapshot.renewal_history,
                renewal_service::history_key(&updated.vehicle),
                record.clone(),
            );

            let working_list: Vec<RucVehicle> = snapshot.vehicles.iter().map(|v| v.vehicle.clone()).collect();
            let persist: OwnedMutexGuard<()> = self.persist_lock.clone().lock_owned().await;
            (record, updated, snapshot.renewal_history.clone(), working_list, persist)
        };

        info!(
            "💳 Renovación de {} km para {} ({}): nuevo límite {} km",
            record.km_added,
            updated.vehicle.description_or_placeholder(),
            updated.vehicle.reg_plate_or_placeholder(),
            record.new_total
        );

        if let Err(e) = self.store.save_renewal_history(&history).await {
            warn!("⚠️ No se pudo guardar el historial de renovaciones: {}", e);
        }
        if let Err(e) = self.store.save_vehicles(&working_list).await {
            warn!("⚠️ No se pudo guardar la lista de trabajo: {}", e);
        }

        Ok((record, updated))
    }

    /// Historial de un vehículo, más reciente al final
    pub async fn vehicle_history(&self, key: &str) -> AppResult<Vec<RenewalRecord>> {
        let snapshot = self.snapshot.read().await;
        let vehicle = snapshot.find(key).ok_or_else(|| not_found_error("Vehicle", key))?;
        Ok(snapshot
            .renewal_history
            .get(&renewal_service::history_key(&vehicle.vehicle))
            .cloned()
            .unwrap_or_default())
    }

    pub async fn renewal_history(&self) -> RenewalHistory {
        self.snapshot.read().await.renewal_history.clone()
    }
}

/// El límite pagado del snapshot vigente gana si es mayor
fn carry_forward_paid_to(next: &mut [MatchedVehicle], current: &[MatchedVehicle]) {
    let current_paid_to: HashMap<String, u64> = current
        .iter()
        .filter_map(|v| v.vehicle.ruc_paid_to.map(|paid| (normalize_plate(&v.vehicle.key()), paid)))
        .collect();

    for vehicle in next.iter_mut() {
        if let Some(&paid) = current_paid_to.get(&normalize_plate(&vehicle.vehicle.key())) {
            if vehicle.vehicle.ruc_paid_to.map_or(true, |existing| paid > existing) {
                vehicle.vehicle.ruc_paid_to = Some(paid);
            }
        }
    }
}
