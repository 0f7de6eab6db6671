//! Almacenamiento local en archivos JSON
//!
//! Dos blobs independientes: la lista de trabajo de vehículos (manifiesto
//! más renovaciones locales) y el historial de renovaciones por matrícula.
//! Sin versionado ni migraciones.

use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{RenewalHistory, RucVehicle};
use crate::utils::errors::AppResult;

pub const FLEET_DATA_FILE: &str = "ruc_fleet_data.json";
pub const RENEWAL_HISTORY_FILE: &str = "ruc_renewal_history.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Lista de trabajo en cache; `None` si nunca se guardó
    pub async fn load_vehicles(&self) -> AppResult<Option<Vec<RucVehicle>>> {
        self.read_json(FLEET_DATA_FILE).await
    }

    pub async fn save_vehicles(&self, vehicles: &[RucVehicle]) -> AppResult<()> {
        self.write_json(FLEET_DATA_FILE, &vehicles).await?;
        debug!("💾 {} vehículos guardados en cache local", vehicles.len());
        Ok(())
    }

    pub async fn load_renewal_history(&self) -> AppResult<RenewalHistory> {
        Ok(self.read_json(RENEWAL_HISTORY_FILE).await?.unwrap_or_default())
    }

    pub async fn save_renewal_history(&self, history: &RenewalHistory) -> AppResult<()> {
        self.write_json(RENEWAL_HISTORY_FILE, history).await?;
        debug!("💾 Historial de renovaciones guardado ({} matrículas)", history.len());
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> AppResult<Option<T>> {
        let path = self.data_dir.join(file_name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Escritura atómica: archivo temporal propio de cada escritura y rename.
    /// El orden entre escrituras lo decide quien llama.
    async fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> AppResult<()> {
        fs::create_dir_all(&self.data_dir).await?;
        let path = self.data_dir.join(file_name);
        let tmp_path = self.data_dir.join(format!("{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        let bytes = serde_json::to_vec_pretty(value)?;
        if let Err(e) = fs::write(&tmp_path, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }
}

/// Cargar el historial sin fallar: un error deja el historial vacío en memoria
pub async fn load_history_or_empty(store: &LocalStore) -> RenewalHistory {
    match store.load_renewal_history().await {
        Ok(history) => {
            info!("📚 Historial de renovaciones cargado ({} matrículas)", history.len());
            history
        }
        Err(e) => {
            warn!("⚠️ No se pudo leer el historial de renovaciones, se usa memoria: {}", e);
            RenewalHistory::new()
        }
    }
}
