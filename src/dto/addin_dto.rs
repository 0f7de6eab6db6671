use serde::Serialize;

use crate::models::LifecycleState;
use crate::services::status_service::FleetSummary;

// Response de un evento del ciclo de vida
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    pub state: LifecycleState,
    /// `true` si el evento lanzó una recarga completa
    pub reloaded: bool,
    /// `true` si la recarga se omitió porque ya había una en curso
    pub refresh_in_progress: bool,
    pub summary: Option<FleetSummary>,
}
