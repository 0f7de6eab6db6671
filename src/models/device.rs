//! Entidades del host de gestión de flota
//!
//! Solo se declaran los campos que consumen el matcher y el resolvedor de
//! odómetro; el resto del esquema del host se ignora.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Referencia a una entidad del host (`{"id": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Dispositivo (vehículo rastreado) del host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub groups: Vec<EntityRef>,
    #[serde(default)]
    pub vehicle_identification_number: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub active_from: Option<String>,
    #[serde(default)]
    pub active_to: Option<String>,
}

impl Device {
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn license_plate(&self) -> Option<&str> {
        non_empty(&self.license_plate)
    }

    pub fn serial_number(&self) -> Option<&str> {
        non_empty(&self.serial_number)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|g| non_empty(&g.name))
    }
}

/// Registro de diagnóstico (StatusData)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub data: Option<f64>,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub diagnostic: Option<EntityRef>,
}

impl StatusData {
    /// Nombre legible del diagnóstico, o su id si el host no lo envió
    pub fn diagnostic_label(&self) -> Option<&str> {
        self.diagnostic
            .as_ref()
            .and_then(|d| non_empty(&d.name).or_else(|| non_empty(&d.id)))
    }
}

/// Registro GPS (LogRecord)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub speed: Option<f64>,
}

/// Viaje (Trip); `distance` es la distancia del viaje, no el total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
}

/// Estado actual del dispositivo (DeviceStatusInfo)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusInfo {
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_device_communicating: Option<bool>,
    #[serde(default)]
    pub is_driving: Option<bool>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
