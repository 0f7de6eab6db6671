//! Refresco periódico de la flota
//!
//! Mientras el add-in no se haya inicializado no se consulta nada. Un tick
//! que coincide con un refresco en curso se descarta.

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::services::fleet_service::RefreshOutcome;
use crate::state::AppState;

/// Qué hizo un tick del refresco periódico
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    NotInitialized,
    Refreshed(RefreshOutcome),
}

/// Un tick: refrescar solo si el add-in ya se inicializó
pub async fn run_refresh_tick(state: &AppState) -> TickOutcome {
    if !state.lifecycle_state().await.is_initialized() {
        debug!("⏸️ Add-in sin inicializar, refresco periódico omitido");
        return TickOutcome::NotInitialized;
    }

    let outcome = state.fleet.refresh().await;
    if let RefreshOutcome::AlreadyRunning = outcome {
        debug!("⏭️ Tick periódico descartado, ya hay un refresco en curso");
    }
    TickOutcome::Refreshed(outcome)
}

pub fn spawn_refresh_scheduler(state: AppState) -> JoinHandle<()> {
    let period = state.config.refresh_interval;
    info!("⏰ Refresco periódico cada {:?}", period);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // el primer tick es inmediato
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_refresh_tick(&state).await;
        }
    })
}
