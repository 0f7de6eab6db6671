//! Resolución de la lectura de odómetro
//!
//! El host no expone un odómetro único y fiable: se prueban varias consultas
//! de telemetría en orden hasta que una da un valor positivo. La unidad del
//! valor tampoco es fiable (km, m o mm según el diagnóstico), así que se
//! infiere con una heurística: pista léxica en el nombre del diagnóstico,
//! luego bandas de magnitud, y al final un límite de plausibilidad.
//! Los umbrales son ajustes empíricos, no constantes del dominio.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::clients::HostGateway;
use crate::models::OdometerReading;
use crate::utils::errors::HostApiError;

/// Límite superior (exclusivo) de una lectura plausible en km
pub const MAX_PLAUSIBLE_KM: f64 = 1_000_000.0;

/// Techo usado en la banda media-alta para aceptar el valor como km
const MEDIUM_BAND_KM_CEILING: f64 = 2_000_000.0;

/// Diagnósticos dedicados al odómetro, en orden de preferencia
pub const ODOMETER_DIAGNOSTIC_IDS: [&str; 4] = [
    "DiagnosticOdometerId",
    "DiagnosticOdometerAdjustmentId",
    "DiagnosticEngineOdometerAdjustmentId",
    "DiagnosticEngineOdometerId",
];

/// Términos que delatan un diagnóstico relacionado con distancia
const ODOMETER_NAME_PATTERNS: [&str; 13] = [
    "odometer", "distance", "mileage", "km", "mile", "total", "cumulative", "engine", "vehicle", "trip",
    "counter", "meter", "reading",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerUnit {
    Kilometres,
    Metres,
    Millimetres,
}

impl OdometerUnit {
    fn divisor(self) -> f64 {
        match self {
            OdometerUnit::Kilometres => 1.0,
            OdometerUnit::Metres => 1_000.0,
            OdometerUnit::Millimetres => 1_000_000.0,
        }
    }
}

/// Pista de unidad a partir del nombre del diagnóstico
pub fn lexical_unit_hint(name: &str) -> Option<OdometerUnit> {
    let lower = name.to_lowercase();
    let has_token = |token: &str| lower.split(|c: char| !c.is_alphanumeric()).any(|t| t == token);

    if lower.contains("millimeter") || lower.contains("millimetre") {
        Some(OdometerUnit::Millimetres)
    } else if lower.contains("kilometer") || lower.contains("kilometre") || has_token("km") {
        Some(OdometerUnit::Kilometres)
    } else if has_token("mm") {
        Some(OdometerUnit::Millimetres)
    } else if lower.contains("meter") || lower.contains("metre") {
        Some(OdometerUnit::Metres)
    } else {
        None
    }
}

/// Interpretaciones de unidad por magnitud, en orden de preferencia
pub fn magnitude_units(raw: f64) -> &'static [OdometerUnit] {
    use OdometerUnit::*;

    if raw > 1_000_000_000.0 {
        &[Millimetres]
    } else if raw > 10_000_000.0 {
        &[Metres]
    } else if raw > 1_000_000.0 {
        if raw < MEDIUM_BAND_KM_CEILING {
            &[Kilometres, Metres]
        } else {
            &[Metres]
        }
    } else if raw > 500_000.0 {
        &[Metres]
    } else {
        &[Kilometres]
    }
}

/// Convertir un valor crudo a km con un límite de plausibilidad (0, 1.000.000)
pub fn to_plausible_km(raw: f64, unit: OdometerUnit) -> Option<u64> {
    let km = (raw / unit.divisor()).round();
    (km > 0.0 && km < MAX_PLAUSIBLE_KM).then_some(km as u64)
}

/// Normalizar un valor crudo de odómetro a km.
/// Una pista léxica se acepta tal cual; sin pista se prueba cada
/// interpretación de la banda hasta que una sea plausible.
pub fn normalize_odometer(raw: f64, diagnostic_name: Option<&str>) -> Option<u64> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }

    match diagnostic_name.and_then(lexical_unit_hint) {
        Some(unit) => to_plausible_km(raw, unit),
        None => magnitude_units(raw)
            .iter()
            .find_map(|&unit| to_plausible_km(raw, unit)),
    }
}

/// Estrategias de búsqueda, en orden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometerStrategy {
    DiagnosticIds,
    LogRecords,
    Trips,
    StatusDataScan,
    DeviceStatusInfo,
    DeviceDetails,
}

impl OdometerStrategy {
    pub const ALL: [OdometerStrategy; 6] = [
        OdometerStrategy::DiagnosticIds,
        OdometerStrategy::LogRecords,
        OdometerStrategy::Trips,
        OdometerStrategy::StatusDataScan,
        OdometerStrategy::DeviceStatusInfo,
        OdometerStrategy::DeviceDetails,
    ];
}

type StrategyResult = Result<Option<(u64, String)>, HostApiError>;

/// Resolvedor de odómetro sobre el gateway del host
#[derive(Clone)]
pub struct OdometerResolver {
    gateway: HostGateway,
}

impl OdometerResolver {
    pub fn new(gateway: HostGateway) -> Self {
        Self { gateway }
    }

    /// Resolver la lectura actual de un dispositivo.
    /// `Failed` solo si ninguna llamada al host obtuvo respuesta.
    pub async fn resolve(&self, device_id: &str) -> OdometerReading {
        info!("🔍 Buscando odómetro para dispositivo {}", device_id);

        let mut answered = false;
        let mut last_error: Option<HostApiError> = None;

        for strategy in OdometerStrategy::ALL {
            debug!("🔧 Estrategia {:?} para dispositivo {}", strategy, device_id);
            match self.run_strategy(strategy, device_id).await {
                Ok(Some((km, source))) => {
                    info!("✅ Odómetro de {}: {} km ({})", device_id, km, source);
                    return OdometerReading::Known { km, source };
                }
                Ok(None) => answered = true,
                Err(e) if e.is_timeout() => {
                    warn!("⏱️ {:?} expiró para {}, se trata como sin datos", strategy, device_id);
                    answered = true;
                }
                Err(e) => {
                    warn!("❌ {:?} falló para {}: {}", strategy, device_id, e);
                    last_error = Some(e);
                }
            }
        }

        match (answered, last_error) {
            (false, Some(error)) => {
                warn!("❌ No se pudo consultar el odómetro de {}: {}", device_id, error);
                OdometerReading::Failed { reason: error.to_string() }
            }
            _ => {
                warn!("❌ Sin datos de odómetro para {} tras todas las estrategias", device_id);
                OdometerReading::NoData
            }
        }
    }

    async fn run_strategy(&self, strategy: OdometerStrategy, device_id: &str) -> StrategyResult {
        match strategy {
            OdometerStrategy::DiagnosticIds => self.from_diagnostic_ids(device_id).await,
            OdometerStrategy::LogRecords => self.from_log_records(device_id).await,
            OdometerStrategy::Trips => self.check_trips(device_id).await,
            OdometerStrategy::StatusDataScan => self.from_status_data_scan(device_id).await,
            OdometerStrategy::DeviceStatusInfo => self.check_device_status(device_id).await,
            OdometerStrategy::DeviceDetails => self.check_device_details(device_id).await,
        }
    }

    async fn from_diagnostic_ids(&self, device_id: &str) -> StrategyResult {
        let mut answered = false;
        let mut last_error = None;

        for diagnostic_id in ODOMETER_DIAGNOSTIC_IDS {
            match self.gateway.get_status_data(device_id, Some(diagnostic_id), 1).await {
                Ok(records) => {
                    answered = true;
                    let Some(record) = records.first() else {
                        debug!("  ❌ Sin datos de {}", diagnostic_id);
                        continue;
                    };
                    let Some(raw) = record.data.filter(|v| *v > 0.0) else {
                        continue;
                    };
                    let label = record.diagnostic_label().unwrap_or(diagnostic_id);
                    match normalize_odometer(raw, Some(label)) {
                        Some(km) => return Ok(Some((km, format!("StatusData:{}", diagnostic_id)))),
                        None => debug!("  ⚠️ Valor {} de {} no es plausible", raw, diagnostic_id),
                    }
                }
                Err(e) if e.is_timeout() => {
                    answered = true;
                    warn!("  ⏱️ {} expiró", diagnostic_id);
                }
                Err(e) => {
                    debug!("  ❌ {} falló: {}", diagnostic_id, e);
                    last_error = Some(e);
                }
            }
        }

        match (answered, last_error) {
            (false, Some(error)) => Err(error),
            _ => Ok(None),
        }
    }

    async fn from_log_records(&self, device_id: &str) -> StrategyResult {
        let records = self.gateway.get_log_records(device_id, 10).await?;
        debug!("  📊 {} LogRecords", records.len());

        Ok(records
            .iter()
            .filter_map(|record| record.odometer.filter(|v| *v > 0.0))
            .find_map(|raw| to_plausible_km(raw, OdometerUnit::Metres))
            .map(|km| (km, "LogRecord".to_string())))
    }

    /// Los viajes solo traen la distancia de cada viaje; se registran para depurar
    async fn check_trips(&self, device_id: &str) -> StrategyResult {
        let trips = self.gateway.get_trips(device_id, 5).await?;
        for trip in trips.iter().filter(|t| t.distance.unwrap_or(0.0) > 0.0) {
            debug!(
                "  🚗 Viaje: distancia {:?}, inicio {:?}, fin {:?}",
                trip.distance, trip.start, trip.stop
            );
        }
        Ok(None)
    }

    async fn from_status_data_scan(&self, device_id: &str) -> StrategyResult {
        let mut records = self.gateway.get_status_data(device_id, None, 200).await?;
        debug!("  📊 {} registros StatusData para {}", records.len(), device_id);

        // Más recientes primero; los registros sin fecha al final
        records.sort_by(|a, b| b.date_time.cmp(&a.date_time));

        let mut inventory: BTreeMap<String, Option<f64>> = BTreeMap::new();
        let mut pattern_matches = 0usize;

        for record in &records {
            let Some(label) = record.diagnostic_label() else {
                continue;
            };
            inventory.entry(label.to_string()).or_insert(record.data);

            let Some(raw) = record.data.filter(|v| *v > 0.0) else {
                continue;
            };
            let lower = label.to_lowercase();
            if !ODOMETER_NAME_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
                continue;
            }

            pattern_matches += 1;
            match normalize_odometer(raw, Some(label)) {
                Some(km) => return Ok(Some((km, format!("StatusData:{}", label)))),
                None => debug!("  ⚠️ '{}' = {} no es plausible, se sigue buscando", label, raw),
            }
        }

        debug!(
            "  📋 {} coincidencias de patrón, {} diagnósticos distintos",
            pattern_matches,
            inventory.len()
        );
        for (name, value) in inventory.iter().take(30) {
            debug!("    '{}' = {:?}", name, value);
        }
        Ok(None)
    }

    async fn check_device_status(&self, device_id: &str) -> StrategyResult {
        let statuses = self.gateway.get_device_status_info(device_id).await?;
        match statuses.first() {
            Some(status) => debug!(
                "  📱 DeviceStatusInfo: comunicando={:?}, conduciendo={:?}, fecha={:?}",
                status.is_device_communicating, status.is_driving, status.date_time
            ),
            None => debug!("  ❌ Sin DeviceStatusInfo"),
        }
        Ok(None)
    }

    async fn check_device_details(&self, device_id: &str) -> StrategyResult {
        match self.gateway.get_device(device_id).await? {
            Some(device) => debug!(
                "  🚛 Dispositivo {}: nombre {:?}, serie {:?}, VIN {:?}, matrícula {:?}",
                device.id, device.name, device.serial_number, device.vehicle_identification_number, device.license_plate
            ),
            None => debug!("  ❌ Sin detalles del dispositivo"),
        }
        Ok(None)
    }
}
