//! Ciclo de vida del add-in
//!
//! El host avisa cuando el add-in se inicializa, gana foco o lo pierde.
//! `initialize` y `focus` disparan una carga completa; `blur` no cancela
//! nada, solo deja de estar en primer plano.

use serde::{Deserialize, Serialize};

use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Active,
    Backgrounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    Initialize,
    Focus,
    Blur,
}

/// Resultado de aplicar un evento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: LifecycleState,
    pub load_data: bool,
}

impl LifecycleState {
    pub fn apply(self, event: LifecycleEvent) -> AppResult<Transition> {
        use LifecycleEvent::*;
        use LifecycleState::*;

        match (self, event) {
            (_, Initialize) => Ok(Transition { next: Active, load_data: true }),
            (Uninitialized, Focus) => Err(AppError::Conflict(
                "add-in must be initialized before it can receive focus".to_string(),
            )),
            (_, Focus) => Ok(Transition { next: Active, load_data: true }),
            (Uninitialized, Blur) => Ok(Transition { next: Uninitialized, load_data: false }),
            (_, Blur) => Ok(Transition { next: Backgrounded, load_data: false }),
        }
    }

    pub fn is_initialized(self) -> bool {
        self != LifecycleState::Uninitialized
    }
}
