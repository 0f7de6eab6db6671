//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::HostApi;
use crate::config::environment::EnvironmentConfig;
use crate::models::{LifecycleEvent, LifecycleState};
use crate::services::fleet_service::{FleetService, RefreshOutcome};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub fleet: FleetService,
    pub lifecycle: Arc<RwLock<LifecycleState>>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, host_api: Arc<dyn HostApi>) -> AppResult<Self> {
        let fleet = FleetService::new(&config, host_api)?;
        Ok(Self {
            config,
            fleet,
            lifecycle: Arc::new(RwLock::new(LifecycleState::default())),
        })
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        *self.lifecycle.read().await
    }

    /// Aplicar un evento del host y, si corresponde, recargar los datos
    pub async fn handle_lifecycle(&self, event: LifecycleEvent) -> AppResult<(LifecycleState, Option<RefreshOutcome>)> {
        let transition = {
            let mut state = self.lifecycle.write().await;
            let transition = state.apply(event)?;
            info!("🔁 Ciclo de vida: {:?} --{:?}--> {:?}", *state, event, transition.next);
            *state = transition.next;
            transition
        };

        let outcome = if transition.load_data {
            Some(self.fleet.refresh().await)
        } else {
            None
        };
        Ok((transition.next, outcome))
    }
}
