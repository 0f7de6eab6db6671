use crate::dto::fleet_dto::{ApiResponse, FleetResponse, RefreshResponse, VehicleRowDto};
use crate::services::status_service::{alerts, RucAlert};
use crate::services::RefreshOutcome;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct FleetController {
    state: AppState,
}

impl FleetController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn overview(&self) -> FleetResponse {
        let snapshot = self.state.fleet.snapshot().await;
        let lifecycle = self.state.lifecycle_state().await;
        let alert_list = alerts(self.state.fleet.thresholds(), &snapshot.vehicles);
        FleetResponse::build(&snapshot, alert_list, lifecycle, self.state.fleet.is_refreshing())
    }

    pub async fn alerts(&self) -> Vec<RucAlert> {
        let snapshot = self.state.fleet.snapshot().await;
        alerts(self.state.fleet.thresholds(), &snapshot.vehicles)
    }

    /// Refresco manual; 409 si ya hay uno en curso
    pub async fn refresh(&self) -> Result<ApiResponse<RefreshResponse>, AppError> {
        match self.state.fleet.refresh().await {
            RefreshOutcome::Completed(summary) => {
                let last_updated = self.state.fleet.snapshot().await.last_updated;
                Ok(ApiResponse::success_with_message(
                    RefreshResponse { summary, last_updated },
                    format!("Fleet refreshed - {} vehicles", summary.total),
                ))
            }
            RefreshOutcome::AlreadyRunning => {
                Err(AppError::Conflict("A fleet refresh is already in progress".to_string()))
            }
        }
    }

    pub async fn refresh_odometer(&self, key: &str) -> Result<ApiResponse<VehicleRowDto>, AppError> {
        let vehicle = self.state.fleet.refresh_vehicle_odometer(key).await?;
        let row = VehicleRowDto::from(&vehicle);
        let message = format!("Odometer for {}: {}", row.reg_plate, row.current_odometer_display);
        Ok(ApiResponse::success_with_message(row, message))
    }
}
