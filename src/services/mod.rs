//! Services module
//!
//! Este módulo contiene la lógica de negocio: emparejamiento, odómetros,
//! estado RUC, manifiesto, renovaciones y el pipeline de la flota.

pub mod fleet_service;
pub mod manifest_service;
pub mod matching_service;
pub mod odometer_service;
pub mod refresh_scheduler;
pub mod renewal_service;
pub mod status_service;

pub use fleet_service::{FleetService, FleetSnapshot, RefreshOutcome};
pub use refresh_scheduler::spawn_refresh_scheduler;
