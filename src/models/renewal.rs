//! Modelo de renovación RUC
//!
//! Una renovación es contabilidad local: suma kilómetros al límite pagado
//! y deja un registro inmutable en el historial de la matrícula.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opciones fijas del menú de renovación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum RenewalOption {
    Km1000,
    Km5000,
    Km10000,
}

impl RenewalOption {
    pub const ALL: [RenewalOption; 3] = [RenewalOption::Km1000, RenewalOption::Km5000, RenewalOption::Km10000];

    pub fn km(self) -> u32 {
        match self {
            RenewalOption::Km1000 => 1000,
            RenewalOption::Km5000 => 5000,
            RenewalOption::Km10000 => 10000,
        }
    }
}

impl From<RenewalOption> for u32 {
    fn from(option: RenewalOption) -> Self {
        option.km()
    }
}

impl TryFrom<u32> for RenewalOption {
    type Error = String;

    fn try_from(km: u32) -> Result<Self, Self::Error> {
        RenewalOption::ALL
            .into_iter()
            .find(|option| option.km() == km)
            .ok_or_else(|| format!("{} km is not a renewal option (allowed: 1000, 5000, 10000)", km))
    }
}

/// Registro inmutable de una renovación
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenewalRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub vehicle_key: String,
    pub reg_plate: Option<String>,
    pub km_added: u32,
    pub new_total: u64,
    pub cost: Decimal,
}

/// Historial de renovaciones por matrícula
pub type RenewalHistory = BTreeMap<String, Vec<RenewalRecord>>;

/// Vista previa de una opción de renovación
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenewalQuote {
    pub km: u32,
    pub current_paid_to: u64,
    pub new_total: u64,
    pub cost: Decimal,
}
