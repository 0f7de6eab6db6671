use serde::{Deserialize, Serialize};
use validator::Validate;

use super::fleet_dto::VehicleRowDto;
use crate::models::{RenewalQuote, RenewalRecord};

// Request para renovar: solo 1000, 5000 o 10000 km
#[derive(Debug, Deserialize, Validate)]
pub struct RenewalRequest {
    #[validate(range(min = 1000, max = 10000, message = "km must be between 1000 and 10000"))]
    pub km: u32,
}

// Response de una renovación aplicada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalResponse {
    pub record: RenewalRecord,
    pub vehicle: VehicleRowDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalQuoteResponse {
    pub vehicle_key: String,
    pub options: Vec<RenewalQuote>,
}
