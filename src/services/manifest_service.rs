//! Carga del manifiesto estático de vehículos RUC
//!
//! El manifiesto es un array JSON publicado por HTTP(S) o un archivo local.
//! Si la descarga falla se usa la lista de trabajo guardada localmente; si
//! tampoco existe, el snapshot sale vacío con un mensaje de error visible.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::LocalStore;
use crate::models::{normalize_plate, RucVehicle};
use crate::utils::errors::ManifestError;

/// Origen del manifiesto
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Remote(String),
    File(PathBuf),
}

impl ManifestSource {
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            ManifestSource::Remote(location.to_string())
        } else {
            ManifestSource::File(PathBuf::from(location.trim_start_matches("file://")))
        }
    }
}

/// De dónde salieron los vehículos del snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataOrigin {
    Manifest,
    Cache { reason: String },
    Unavailable { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub vehicles: Vec<RucVehicle>,
    pub origin: DataOrigin,
}

#[derive(Clone)]
pub struct ManifestLoader {
    client: Client,
    source: ManifestSource,
    timeout: Duration,
}

impl ManifestLoader {
    pub fn new(source: ManifestSource, timeout: Duration) -> Result<Self, ManifestError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, source, timeout })
    }

    /// Descargar y decodificar el manifiesto
    pub async fn fetch(&self) -> Result<Vec<RucVehicle>, ManifestError> {
        let body = match &self.source {
            ManifestSource::Remote(url) => {
                let url = cache_busting_url(url, chrono::Utc::now().timestamp_millis());
                info!("📥 Cargando manifiesto RUC desde {}", url);
                tokio::time::timeout(self.timeout, self.fetch_remote(&url))
                    .await
                    .map_err(|_| ManifestError::Timeout(self.timeout))??
            }
            ManifestSource::File(path) => {
                info!("📂 Cargando manifiesto RUC desde {}", path.display());
                tokio::fs::read_to_string(path).await?
            }
        };

        let vehicles = parse_manifest(&body)?;
        info!("✅ {} vehículos cargados del manifiesto", vehicles.len());
        Ok(vehicles)
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, ManifestError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Añadir `v=<epoch ms>` para saltarse caches intermedias
pub fn cache_busting_url(url: &str, timestamp_millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}v={}", url, separator, timestamp_millis)
}

/// Decodificar el array; los elementos que no son registros se descartan
pub fn parse_manifest(body: &str) -> Result<Vec<RucVehicle>, ManifestError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ManifestError::Format(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ManifestError::Format("expected a JSON array of vehicles".to_string()));
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RucVehicle>(item) {
            Ok(vehicle) => Some(vehicle),
            Err(e) => {
                warn!("⚠️ Registro {} del manifiesto descartado: {}", index, e);
                None
            }
        })
        .collect())
}

/// Unir el manifiesto con la lista de trabajo: el manifiesto decide qué
/// vehículos existen, y el límite pagado nunca baja respecto al guardado.
pub fn merge_working_list(fetched: Vec<RucVehicle>, cached: &[RucVehicle]) -> Vec<RucVehicle> {
    let cached_paid_to: HashMap<String, u64> = cached
        .iter()
        .filter_map(|v| v.ruc_paid_to.map(|paid| (normalize_plate(&v.key()), paid)))
        .collect();

    fetched
        .into_iter()
        .map(|mut vehicle| {
            if let Some(&saved) = cached_paid_to.get(&normalize_plate(&vehicle.key())) {
                if vehicle.ruc_paid_to.map_or(true, |paid| saved > paid) {
                    vehicle.ruc_paid_to = Some(saved);
                }
            }
            vehicle
        })
        .collect()
}

/// Cargar la lista de trabajo: manifiesto, o cache local si falla.
/// No escribe nada; la lista unida se guarda al publicar el snapshot.
pub async fn load_working_list(loader: &ManifestLoader, store: &LocalStore) -> LoadedManifest {
    let cached = match store.load_vehicles().await {
        Ok(cached) => cached,
        Err(e) => {
            warn!("⚠️ No se pudo leer la cache de vehículos: {}", e);
            None
        }
    };

    match loader.fetch().await {
        Ok(fetched) => {
            let vehicles = merge_working_list(fetched, cached.as_deref().unwrap_or_default());
            LoadedManifest {
                vehicles,
                origin: DataOrigin::Manifest,
            }
        }
        Err(e) => match cached {
            Some(vehicles) => {
                warn!("⚠️ Manifiesto no disponible ({}), usando {} vehículos en cache", e, vehicles.len());
                LoadedManifest {
                    vehicles,
                    origin: DataOrigin::Cache { reason: e.to_string() },
                }
            }
            None => {
                warn!("❌ Manifiesto no disponible y sin cache local: {}", e);
                LoadedManifest {
                    vehicles: Vec::new(),
                    origin: DataOrigin::Unavailable {
                        reason: format!("Error loading RUC data: {}", e),
                    },
                }
            }
        },
    }
}
