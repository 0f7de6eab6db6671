use validator::Validate;

use crate::dto::fleet_dto::{ApiResponse, VehicleRowDto};
use crate::dto::renewal_dto::{RenewalQuoteResponse, RenewalRequest, RenewalResponse};
use crate::models::{RenewalHistory, RenewalOption, RenewalRecord};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};
use crate::utils::format::format_km;

pub struct RenewalController {
    state: AppState,
}

impl RenewalController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn quote(&self, key: &str) -> Result<RenewalQuoteResponse, AppError> {
        let options = self.state.fleet.quote_renewal(key).await?;
        Ok(RenewalQuoteResponse {
            vehicle_key: key.to_string(),
            options,
        })
    }

    pub async fn renew(&self, key: &str, request: RenewalRequest) -> Result<ApiResponse<RenewalResponse>, AppError> {
        // Validar rango y luego el menú fijo
        request.validate()?;
        let option = RenewalOption::try_from(request.km).map_err(bad_request_error)?;

        let (record, vehicle) = self.state.fleet.renew(key, option).await?;
        let message = format!(
            "RUC renewed: {} km added to {}. New limit {} km",
            format_km(i64::from(record.km_added)),
            vehicle.vehicle.reg_plate_or_placeholder(),
            format_km(record.new_total as i64)
        );

        Ok(ApiResponse::success_with_message(
            RenewalResponse {
                record,
                vehicle: VehicleRowDto::from(&vehicle),
            },
            message,
        ))
    }

    pub async fn vehicle_history(&self, key: &str) -> Result<Vec<RenewalRecord>, AppError> {
        self.state.fleet.vehicle_history(key).await
    }

    pub async fn history(&self) -> RenewalHistory {
        self.state.fleet.renewal_history().await
    }
}
