use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{LifecycleState, MatchStrategy, MatchedVehicle, OdometerReading, RenewalOption, RucStatus, StatusKind};
use crate::services::manifest_service::DataOrigin;
use crate::services::status_service::{FleetSummary, RucAlert};
use crate::services::FleetSnapshot;
use crate::utils::format::format_km;

pub const NO_ODOMETER_DATA: &str = "NO ODOMETER DATA";
pub const NO_DATA_LABEL: &str = "No Data";

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

// Fila de la tabla de flota
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRowDto {
    pub key: String,
    pub vehicle_description: String,
    pub fleet_number: String,
    pub reg_plate: String,
    pub ruc_paid_to: Option<u64>,
    pub ruc_paid_to_display: String,
    pub current_odometer: Option<u64>,
    pub current_odometer_display: String,
    pub odometer: OdometerReading,
    pub remaining_display: String,
    pub status: Option<RucStatus>,
    pub status_label: String,
    pub has_geotab_data: bool,
    pub device_name: Option<String>,
    pub match_strategy: Option<MatchStrategy>,
    pub can_refresh_odometer: bool,
    pub can_renew: bool,
}

impl From<&MatchedVehicle> for VehicleRowDto {
    fn from(matched: &MatchedVehicle) -> Self {
        let vehicle = &matched.vehicle;
        let current = matched.odometer.km();

        let remaining_display = match (current, &matched.ruc_status) {
            (None, _) => NO_ODOMETER_DATA.to_string(),
            (Some(_), Some(status)) if status.kind == StatusKind::Critical => "EXPIRED".to_string(),
            (Some(_), Some(status)) => format!("{} km remaining", format_km(status.remaining_km)),
            (Some(_), None) => "--".to_string(),
        };

        Self {
            key: vehicle.key(),
            vehicle_description: vehicle.description_or_placeholder().to_string(),
            fleet_number: vehicle.fleet_number_or_placeholder().to_string(),
            reg_plate: vehicle.reg_plate_or_placeholder().to_string(),
            ruc_paid_to: vehicle.ruc_paid_to,
            ruc_paid_to_display: km_or_placeholder(vehicle.ruc_paid_to),
            current_odometer: current,
            current_odometer_display: current
                .map(|km| format!("{} km", format_km(km as i64)))
                .unwrap_or_else(|| NO_ODOMETER_DATA.to_string()),
            odometer: matched.odometer.clone(),
            remaining_display,
            status_label: matched
                .ruc_status
                .as_ref()
                .map(|s| s.label.to_string())
                .unwrap_or_else(|| NO_DATA_LABEL.to_string()),
            status: matched.ruc_status.clone(),
            has_geotab_data: matched.has_geotab_data,
            device_name: matched
                .geotab_device
                .as_ref()
                .map(|d| d.name().unwrap_or(&d.id).to_string()),
            match_strategy: matched.match_strategy,
            can_refresh_odometer: matched.has_geotab_data,
            can_renew: matched.ruc_status.as_ref().map_or(true, |s| s.kind != StatusKind::Ok),
        }
    }
}

fn km_or_placeholder(km: Option<u64>) -> String {
    km.map(|km| format!("{} km", format_km(km as i64)))
        .unwrap_or_else(|| "--".to_string())
}

// Vista completa de la flota
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetResponse {
    pub status_message: String,
    pub lifecycle: LifecycleState,
    pub origin: Option<DataOrigin>,
    pub error_banner: Option<String>,
    pub host_error: Option<String>,
    pub summary: FleetSummary,
    pub alerts: Vec<RucAlert>,
    pub vehicles: Vec<VehicleRowDto>,
    pub device_count: usize,
    pub renewal_options: Vec<RenewalOption>,
    pub refreshing: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FleetResponse {
    pub fn build(
        snapshot: &FleetSnapshot,
        alerts: Vec<RucAlert>,
        lifecycle: LifecycleState,
        refreshing: bool,
    ) -> Self {
        let summary = snapshot.summary();

        let error_banner = match &snapshot.origin {
            Some(DataOrigin::Unavailable { reason }) => Some(reason.clone()),
            _ => None,
        };

        let status_message = match (&snapshot.origin, snapshot.is_loaded()) {
            (_, false) => "Loading fleet data...".to_string(),
            (Some(DataOrigin::Unavailable { .. }), true) => "Error loading RUC data".to_string(),
            (Some(DataOrigin::Cache { .. }), true) => {
                format!("Offline - {} vehicles loaded from local cache", summary.total)
            }
            _ => format!("Connected - {} vehicles loaded", summary.total),
        };

        Self {
            status_message,
            lifecycle,
            origin: snapshot.origin.clone(),
            error_banner,
            host_error: snapshot.host_error.clone(),
            summary,
            alerts,
            vehicles: snapshot.vehicles.iter().map(VehicleRowDto::from).collect(),
            device_count: snapshot.device_count,
            renewal_options: RenewalOption::ALL.to_vec(),
            refreshing,
            last_updated: snapshot.last_updated,
        }
    }
}

// Resultado de un refresco manual
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub summary: FleetSummary,
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RucThresholds;
    use crate::models::{Device, RucVehicle};
    use crate::services::status_service::status_for;

    fn row(paid_to: u64, reading: OdometerReading) -> VehicleRowDto {
        let mut matched = MatchedVehicle::matched(
            RucVehicle {
                vehicle_description: Some("Isuzu FVZ".into()),
                fleet_number: Some("101".into()),
                reg_plate: Some("ABC123".into()),
                ruc_paid_to: Some(paid_to),
            },
            Device {
                id: "b1".into(),
                name: Some("101 - Truck".into()),
                ..Default::default()
            },
            MatchStrategy::FleetNumberInName,
        );
        matched.odometer = reading;
        matched.ruc_status = status_for(&RucThresholds::default(), &matched);
        VehicleRowDto::from(&matched)
    }

    #[test]
    fn test_row_without_reading() {
        let row = row(50_000, OdometerReading::NoData);
        assert_eq!(row.remaining_display, NO_ODOMETER_DATA);
        assert_eq!(row.current_odometer_display, NO_ODOMETER_DATA);
        assert_eq!(row.status_label, NO_DATA_LABEL);
        assert_eq!(row.ruc_paid_to_display, "50,000 km");
        assert!(row.can_refresh_odometer);
        assert!(row.can_renew);
        assert_eq!(row.device_name.as_deref(), Some("101 - Truck"));
    }

    #[test]
    fn test_row_expired_and_ok() {
        let expired = row(50_000, OdometerReading::Known { km: 50_100, source: "t".into() });
        assert_eq!(expired.remaining_display, "EXPIRED");
        assert_eq!(expired.status_label, "EXPIRED");

        let ok = row(50_000, OdometerReading::Known { km: 38_000, source: "t".into() });
        assert_eq!(ok.remaining_display, "12,000 km remaining");
        assert!(!ok.can_renew);
    }
}
