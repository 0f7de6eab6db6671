use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::lifecycle_controller::LifecycleController;
use crate::dto::addin_dto::LifecycleResponse;
use crate::dto::fleet_dto::ApiResponse;
use crate::models::LifecycleEvent;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Eventos que el host envía al add-in
pub fn create_addin_router() -> Router<AppState> {
    Router::new()
        .route("/initialize", post(initialize))
        .route("/focus", post(focus))
        .route("/blur", post(blur))
        .route("/state", get(current_state))
}

async fn initialize(State(state): State<AppState>) -> Result<Json<ApiResponse<LifecycleResponse>>, AppError> {
    let controller = LifecycleController::new(state);
    Ok(Json(controller.handle(LifecycleEvent::Initialize).await?))
}

async fn focus(State(state): State<AppState>) -> Result<Json<ApiResponse<LifecycleResponse>>, AppError> {
    let controller = LifecycleController::new(state);
    Ok(Json(controller.handle(LifecycleEvent::Focus).await?))
}

async fn blur(State(state): State<AppState>) -> Result<Json<ApiResponse<LifecycleResponse>>, AppError> {
    let controller = LifecycleController::new(state);
    Ok(Json(controller.handle(LifecycleEvent::Blur).await?))
}

async fn current_state(State(state): State<AppState>) -> Json<LifecycleResponse> {
    let controller = LifecycleController::new(state);
    Json(controller.current().await)
}
