//! Contrato de la API del host
//!
//! El host expone una primitiva genérica `call(método, parámetros)`. El resto
//! del sistema depende solo de este trait para poder usar el cliente real,
//! el cliente sin credenciales o un host simulado en los tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::utils::errors::HostApiError;

#[async_trait]
pub trait HostApi: Send + Sync {
    /// Ejecutar un método JSON-RPC del host y devolver su `result`
    async fn call(&self, method: &str, params: Value) -> Result<Value, HostApiError>;
}

/// Host usado cuando no hay credenciales configuradas: toda llamada falla
/// con `NotConfigured` y el pipeline lo trata como "sin telemetría".
#[derive(Debug, Default, Clone)]
pub struct OfflineHostApi;

#[async_trait]
impl HostApi for OfflineHostApi {
    async fn call(&self, method: &str, _params: Value) -> Result<Value, HostApiError> {
        tracing::debug!("📴 Host sin configurar, ignorando llamada '{}'", method);
        Err(HostApiError::NotConfigured)
    }
}
