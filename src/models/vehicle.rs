//! Modelo de Vehicle
//!
//! Este módulo contiene el registro del manifiesto RUC, el vehículo ya
//! emparejado con su dispositivo del host y el estado RUC calculado.
//! Los campos del manifiesto son opcionales: el archivo viene editado a
//! mano y no siempre trae matrícula o número de flota.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::device::Device;

lazy_static! {
    static ref PLATE_SEPARATORS: Regex = Regex::new(r"[-\s]").unwrap();
}

/// Registro del manifiesto estático (RUC_Data.json)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RucVehicle {
    #[serde(default, deserialize_with = "text_or_number")]
    pub vehicle_description: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub fleet_number: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub reg_plate: Option<String>,
    #[serde(default, deserialize_with = "kilometres")]
    pub ruc_paid_to: Option<u64>,
}

impl RucVehicle {
    /// Clave estable del vehículo: matrícula, número de flota o descripción
    pub fn key(&self) -> String {
        self.reg_plate
            .clone()
            .or_else(|| self.fleet_number.clone())
            .or_else(|| self.vehicle_description.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Verificar si una clave recibida por la API designa este vehículo
    pub fn matches_key(&self, candidate: &str) -> bool {
        let candidate = normalize_plate(candidate);
        if candidate.is_empty() {
            return false;
        }
        [&self.reg_plate, &self.fleet_number]
            .iter()
            .filter_map(|field| field.as_deref())
            .any(|value| normalize_plate(value) == candidate)
            || normalize_plate(&self.key()) == candidate
    }

    pub fn description_or_placeholder(&self) -> &str {
        self.vehicle_description.as_deref().unwrap_or("Unknown")
    }

    pub fn fleet_number_or_placeholder(&self) -> &str {
        self.fleet_number.as_deref().unwrap_or("--")
    }

    pub fn reg_plate_or_placeholder(&self) -> &str {
        self.reg_plate.as_deref().unwrap_or("--")
    }
}

/// Normalizar matrícula: sin espacios ni guiones, en minúsculas
pub fn normalize_plate(plate: &str) -> String {
    PLATE_SEPARATORS.replace_all(plate.trim(), "").to_lowercase()
}

/// Estrategia del matcher que encontró el dispositivo, en orden de confianza
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    FleetNumberInName,
    ExactPlate,
    NormalizedPlate,
    PlateInName,
    GroupName,
    SerialNumber,
}

/// Lectura de odómetro en tres estados
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OdometerReading {
    Known { km: u64, source: String },
    NoData,
    Failed { reason: String },
}

impl OdometerReading {
    pub fn km(&self) -> Option<u64> {
        match self {
            OdometerReading::Known { km, .. } => Some(*km),
            _ => None,
        }
    }
}

/// Nivel de urgencia del estado RUC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ok,
    Warning,
    Critical,
}

/// Estado RUC calculado para un vehículo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RucStatus {
    pub kind: StatusKind,
    /// Restante para mostrar, nunca negativo
    pub remaining_km: i64,
    /// rucPaidTo - odómetro, negativo si ya expiró
    pub balance_km: i64,
    pub label: &'static str,
}

/// Vehículo del manifiesto unido a su dispositivo y su lectura actual
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedVehicle {
    #[serde(flatten)]
    pub vehicle: RucVehicle,
    pub geotab_device: Option<Device>,
    pub match_strategy: Option<MatchStrategy>,
    pub has_geotab_data: bool,
    pub odometer: OdometerReading,
    pub ruc_status: Option<RucStatus>,
}

impl MatchedVehicle {
    pub fn unmatched(vehicle: RucVehicle) -> Self {
        Self {
            vehicle,
            geotab_device: None,
            match_strategy: None,
            has_geotab_data: false,
            odometer: OdometerReading::NoData,
            ruc_status: None,
        }
    }

    pub fn matched(vehicle: RucVehicle, device: Device, strategy: MatchStrategy) -> Self {
        Self {
            vehicle,
            geotab_device: Some(device),
            match_strategy: Some(strategy),
            has_geotab_data: true,
            odometer: OdometerReading::NoData,
            ruc_status: None,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.geotab_device.as_ref().map(|d| d.id.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrNumber::Text(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(TextOrNumber::Integer(n)) => Some(n.to_string()),
        Some(TextOrNumber::Float(f)) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
        Some(TextOrNumber::Float(f)) => Some(f.to_string()),
        None => None,
    })
}

fn kilometres<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrNumber::Integer(n)) if n >= 0 => Some(n as u64),
        Some(TextOrNumber::Float(f)) if f.is_finite() && f >= 0.0 => Some(f.round() as u64),
        Some(TextOrNumber::Text(text)) => text.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}
