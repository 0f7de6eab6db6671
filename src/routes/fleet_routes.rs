use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::fleet_controller::FleetController;
use crate::controllers::renewal_controller::RenewalController;
use crate::dto::fleet_dto::{ApiResponse, FleetResponse, RefreshResponse, VehicleRowDto};
use crate::dto::renewal_dto::{RenewalQuoteResponse, RenewalRequest, RenewalResponse};
use crate::models::{RenewalHistory, RenewalRecord};
use crate::services::status_service::RucAlert;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};
use crate::views::render_fleet_page;

pub fn create_fleet_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_fleet))
        .route("/table", get(get_fleet_table))
        .route("/refresh", post(refresh_fleet))
        .route("/alerts", get(get_alerts))
        .route("/renewals", get(get_renewal_history))
        .route("/vehicles/:key/odometer", post(refresh_odometer))
        .route("/vehicles/:key/renewal-quote", get(get_renewal_quote))
        .route("/vehicles/:key/renewals", post(renew_vehicle))
        .route("/vehicles/:key/renewals", get(get_vehicle_renewals))
}

async fn get_fleet(State(state): State<AppState>) -> Json<FleetResponse> {
    let controller = FleetController::new(state);
    Json(controller.overview().await)
}

async fn get_fleet_table(State(state): State<AppState>) -> Html<String> {
    let controller = FleetController::new(state);
    Html(render_fleet_page(&controller.overview().await))
}

async fn refresh_fleet(State(state): State<AppState>) -> Result<Json<ApiResponse<RefreshResponse>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.refresh().await?))
}

async fn get_alerts(State(state): State<AppState>) -> Json<Vec<RucAlert>> {
    let controller = FleetController::new(state);
    Json(controller.alerts().await)
}

async fn refresh_odometer(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<VehicleRowDto>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.refresh_odometer(&key).await?))
}

async fn get_renewal_quote(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<RenewalQuoteResponse>, AppError> {
    let controller = RenewalController::new(state);
    Ok(Json(controller.quote(&key).await?))
}

async fn renew_vehicle(
    State(state): State<AppState>,
    Path(key): Path<String>,
    request: Result<Json<RenewalRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RenewalResponse>>, AppError> {
    let Json(request) = request.map_err(|e| bad_request_error(e.body_text()))?;
    let controller = RenewalController::new(state);
    Ok(Json(controller.renew(&key, request).await?))
}

async fn get_vehicle_renewals(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Vec<RenewalRecord>>, AppError> {
    let controller = RenewalController::new(state);
    Ok(Json(controller.vehicle_history(&key).await?))
}

async fn get_renewal_history(State(state): State<AppState>) -> Json<RenewalHistory> {
    let controller = RenewalController::new(state);
    Json(controller.history().await)
}
