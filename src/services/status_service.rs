//! Clasificación del estado RUC
//!
//! Funciones puras: el estado depende solo de la lectura actual, del límite
//! pagado y de los umbrales configurados.

use serde::Serialize;

use crate::config::RucThresholds;
use crate::models::{MatchedVehicle, RucStatus, StatusKind};

/// Clasificar con los umbrales por defecto (2000 km)
pub fn classify(current_odometer: u64, ruc_paid_to: u64) -> RucStatus {
    classify_with(&RucThresholds::default(), current_odometer, ruc_paid_to)
}

pub fn classify_with(thresholds: &RucThresholds, current_odometer: u64, ruc_paid_to: u64) -> RucStatus {
    let balance = ruc_paid_to as i64 - current_odometer as i64;

    if balance <= 0 {
        RucStatus {
            kind: StatusKind::Critical,
            remaining_km: 0,
            balance_km: balance,
            label: "EXPIRED",
        }
    } else if balance <= thresholds.warning_km {
        RucStatus {
            kind: StatusKind::Warning,
            remaining_km: balance,
            balance_km: balance,
            label: "RENEWAL DUE",
        }
    } else {
        RucStatus {
            kind: StatusKind::Ok,
            remaining_km: balance,
            balance_km: balance,
            label: "OK",
        }
    }
}

/// Estado de un vehículo emparejado; `None` si falta la lectura o el límite
pub fn status_for(thresholds: &RucThresholds, vehicle: &MatchedVehicle) -> Option<RucStatus> {
    let current = vehicle.odometer.km()?;
    let paid_to = vehicle.vehicle.ruc_paid_to?;
    Some(classify_with(thresholds, current, paid_to))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Urgent,
    Warning,
}

/// Entrada de la lista de alertas
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RucAlert {
    pub vehicle_key: String,
    pub vehicle_description: String,
    pub reg_plate: String,
    pub remaining_km: i64,
    pub urgency: Urgency,
    pub message: String,
}

/// Vehículos con estado calculable y restante <= umbral de aviso
pub fn alerts(thresholds: &RucThresholds, vehicles: &[MatchedVehicle]) -> Vec<RucAlert> {
    vehicles
        .iter()
        .filter_map(|vehicle| {
            let status = vehicle.ruc_status.as_ref()?;
            if status.remaining_km > thresholds.warning_km {
                return None;
            }
            let urgency = if status.remaining_km <= thresholds.urgent_km {
                Urgency::Urgent
            } else {
                Urgency::Warning
            };
            Some(RucAlert {
                vehicle_key: vehicle.vehicle.key(),
                vehicle_description: vehicle.vehicle.description_or_placeholder().to_string(),
                reg_plate: vehicle.vehicle.reg_plate_or_placeholder().to_string(),
                remaining_km: status.remaining_km,
                urgency,
                message: format!(
                    "{} ({}) has only {} km remaining on RUC license",
                    vehicle.vehicle.description_or_placeholder(),
                    vehicle.vehicle.reg_plate_or_placeholder(),
                    crate::utils::format::format_km(status.remaining_km)
                ),
            })
        })
        .collect()
}

/// Contadores del resumen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub total: usize,
    pub active: usize,
    pub alerts: usize,
    pub no_data: usize,
}

pub fn summarize(vehicles: &[MatchedVehicle]) -> FleetSummary {
    vehicles.iter().fold(
        FleetSummary {
            total: vehicles.len(),
            ..Default::default()
        },
        |mut summary, vehicle| {
            match vehicle.ruc_status.as_ref().map(|s| s.kind) {
                None => summary.no_data += 1,
                Some(StatusKind::Ok) => summary.active += 1,
                Some(StatusKind::Warning) => {
                    summary.active += 1;
                    summary.alerts += 1;
                }
                Some(StatusKind::Critical) => summary.alerts += 1,
            }
            summary
        },
    )
}
