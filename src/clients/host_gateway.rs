//! Acceso tipado a las entidades del host
//!
//! Envuelve cualquier `HostApi` con un timeout por llamada y decodifica
//! los resultados de `Get` a los modelos del sistema.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::host_api::HostApi;
use crate::models::{Device, DeviceStatusInfo, LogRecord, StatusData, Trip};
use crate::utils::errors::HostApiError;

#[derive(Clone)]
pub struct HostGateway {
    api: Arc<dyn HostApi>,
    timeout: Duration,
}

impl HostGateway {
    pub fn new(api: Arc<dyn HostApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// `Get` genérico sobre un tipo de entidad del host
    pub async fn get<T: DeserializeOwned>(
        &self,
        type_name: &str,
        search: Option<Value>,
        results_limit: Option<u32>,
    ) -> Result<Vec<T>, HostApiError> {
        let mut params = json!({ "typeName": type_name });
        if let Some(search) = search {
            params["search"] = search;
        }
        if let Some(limit) = results_limit {
            params["resultsLimit"] = json!(limit);
        }

        let value = tokio::time::timeout(self.timeout, self.api.call("Get", params))
            .await
            .map_err(|_| HostApiError::Timeout(self.timeout))??;

        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_devices(&self) -> Result<Vec<Device>, HostApiError> {
        self.get("Device", None, None).await
    }

    pub async fn get_device(&self, device_id: &str) -> Result<Option<Device>, HostApiError> {
        let devices: Vec<Device> = self.get("Device", Some(json!({ "id": device_id })), None).await?;
        Ok(devices.into_iter().next())
    }

    pub async fn get_status_data(
        &self,
        device_id: &str,
        diagnostic_id: Option<&str>,
        results_limit: u32,
    ) -> Result<Vec<StatusData>, HostApiError> {
        let mut search = json!({ "deviceSearch": { "id": device_id } });
        if let Some(diagnostic_id) = diagnostic_id {
            search["diagnosticSearch"] = json!({ "id": diagnostic_id });
        }
        self.get("StatusData", Some(search), Some(results_limit)).await
    }

    pub async fn get_log_records(&self, device_id: &str, results_limit: u32) -> Result<Vec<LogRecord>, HostApiError> {
        self.get("LogRecord", Some(device_search(device_id)), Some(results_limit)).await
    }

    pub async fn get_trips(&self, device_id: &str, results_limit: u32) -> Result<Vec<Trip>, HostApiError> {
        self.get("Trip", Some(device_search(device_id)), Some(results_limit)).await
    }

    pub async fn get_device_status_info(&self, device_id: &str) -> Result<Vec<DeviceStatusInfo>, HostApiError> {
        self.get("DeviceStatusInfo", Some(device_search(device_id)), None).await
    }
}

fn device_search(device_id: &str) -> Value {
    json!({ "deviceSearch": { "id": device_id } })
}
