//! Sistema de manejo de errores
//!
//! Este módulo define los errores de la aplicación y su conversión a
//! respuestas HTTP. Los errores del host y del manifiesto tienen sus
//! propios tipos porque el pipeline los convierte en "sin datos" en vez
//! de propagarlos.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Host API error: {0}")]
    HostApi(#[from] HostApiError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Errores de las llamadas JSON-RPC al host
#[derive(Error, Debug)]
pub enum HostApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("host returned {name}: {message}")]
    Rpc { name: String, message: String },

    #[error("could not decode host response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("host call timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("host API credentials are not configured")]
    NotConfigured,
}

impl HostApiError {
    /// La sesión caducó y hay que volver a autenticarse
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, HostApiError::Rpc { name, .. } if name.contains("InvalidUserException"))
    }

    /// Un timeout cuenta como "sin datos" para esa llamada
    pub fn is_timeout(&self) -> bool {
        matches!(self, HostApiError::Timeout(_))
    }
}

/// Errores al cargar el manifiesto estático de vehículos
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("manifest server answered HTTP {0}")]
    Status(u16),

    #[error("manifest request timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not read manifest file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest format: {0}")]
    Format(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Configuration Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFIG_ERROR".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                tracing::warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Storage Error".to_string(),
                        message: "An error occurred while accessing local storage".to_string(),
                        details: Some(json!({ "io_error": e.to_string() })),
                        code: Some("STORAGE_ERROR".to_string()),
                    },
                )
            }

            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Serialization Error".to_string(),
                        message: "Stored data could not be encoded or decoded".to_string(),
                        details: Some(json!({ "serde_error": e.to_string() })),
                        code: Some("SERIALIZATION_ERROR".to_string()),
                    },
                )
            }

            AppError::HostApi(e) => {
                tracing::error!("Host API error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Host API Error".to_string(),
                        message: "An error occurred while communicating with the fleet host".to_string(),
                        details: Some(json!({ "host_api_error": e.to_string() })),
                        code: Some("HOST_API_ERROR".to_string()),
                    },
                )
            }

            AppError::Manifest(e) => {
                tracing::error!("Manifest error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Manifest Error".to_string(),
                        message: "The vehicle manifest could not be loaded".to_string(),
                        details: Some(json!({ "manifest_error": e.to_string() })),
                        code: Some("MANIFEST_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with key '{}' not found", resource, id))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: impl Into<String>) -> AppError {
    AppError::BadRequest(message.into())
}
