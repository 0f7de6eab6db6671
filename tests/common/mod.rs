//! Utilidades compartidas por los tests de integración

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ruc_license_manager::clients::HostApi;
use ruc_license_manager::config::EnvironmentConfig;
use ruc_license_manager::state::AppState;
use ruc_license_manager::utils::errors::HostApiError;

/// Host simulado: una lista de dispositivos y, opcionalmente, una lectura
/// de `DiagnosticOdometerId` por dispositivo.
#[derive(Default)]
pub struct FakeHost {
    pub devices: Vec<Value>,
    pub odometers: Vec<(String, f64)>,
    pub device_delay: Option<Duration>,
    pub device_calls: AtomicUsize,
}

impl FakeHost {
    pub fn with_devices(devices: Vec<Value>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    pub fn odometer(mut self, device_id: &str, raw: f64) -> Self {
        self.odometers.push((device_id.to_string(), raw));
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.device_delay = Some(delay);
        self
    }
}

#[async_trait]
impl HostApi for FakeHost {
    async fn call(&self, method: &str, params: Value) -> Result<Value, HostApiError> {
        if method != "Get" {
            return Err(HostApiError::Rpc {
                name: "MissingMethodException".into(),
                message: method.into(),
            });
        }

        match params["typeName"].as_str() {
            Some("Device") => {
                self.device_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(delay) = self.device_delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(Value::Array(self.devices.clone()))
            }
            Some("StatusData") => {
                let device_id = params["search"]["deviceSearch"]["id"].as_str().unwrap_or_default();
                let diagnostic = params["search"]["diagnosticSearch"]["id"].as_str();
                let reading = self
                    .odometers
                    .iter()
                    .find(|(id, _)| id == device_id)
                    .filter(|_| diagnostic == Some("DiagnosticOdometerId"));
                Ok(match reading {
                    Some((_, raw)) => json!([{
                        "id": "sd1",
                        "data": raw,
                        "diagnostic": { "id": "DiagnosticOdometerId", "name": "Odometer" }
                    }]),
                    None => json!([]),
                })
            }
            _ => Ok(json!([])),
        }
    }
}

pub fn device(id: &str, name: &str, plate: Option<&str>) -> Value {
    json!({ "id": id, "name": name, "licensePlate": plate })
}

/// Servidor HTTP local que publica el manifiesto con un retraso fijo.
/// Devuelve la URL del manifiesto.
pub async fn spawn_manifest_server(manifest: Value, delay: Duration) -> String {
    let app = axum::Router::new().route(
        "/RUC_Data.json",
        axum::routing::get(move || {
            let manifest = manifest.clone();
            async move {
                tokio::time::sleep(delay).await;
                axum::Json(manifest)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/RUC_Data.json", addr)
}

/// Estado con el manifiesto servido por HTTP
pub fn remote_state(dir: &Path, manifest_url: &str, host: FakeHost) -> AppState {
    let config = EnvironmentConfig {
        manifest_url: manifest_url.to_string(),
        data_dir: dir.join("store"),
        host_call_timeout: Duration::from_secs(2),
        auto_initialize: false,
        ..Default::default()
    };
    AppState::new(config, Arc::new(host)).unwrap()
}

/// Escribir el manifiesto en el directorio temporal y devolver la config
pub fn test_config(dir: &Path, manifest: Value) -> EnvironmentConfig {
    let manifest_path = dir.join("RUC_Data.json");
    std::fs::write(&manifest_path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    EnvironmentConfig {
        manifest_url: manifest_path.to_string_lossy().into_owned(),
        data_dir: dir.join("store"),
        host_call_timeout: Duration::from_secs(2),
        auto_initialize: false,
        ..Default::default()
    }
}

pub fn test_state(dir: &Path, manifest: Value, host: FakeHost) -> AppState {
    test_state_with(dir, manifest, Arc::new(host))
}

pub fn test_state_with(dir: &Path, manifest: Value, host: Arc<dyn HostApi>) -> AppState {
    AppState::new(test_config(dir, manifest), host).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
