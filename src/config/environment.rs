//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Las variables ausentes
//! usan valores por defecto; las que no se pueden parsear son un error.

use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::errors::{AppError, AppResult};

/// URL pública del manifiesto RUC
pub const DEFAULT_MANIFEST_URL: &str = "https://kikorangee.github.io/RUC1/RUC_AddIn/RUC_Data.json";

/// Umbrales de clasificación RUC (km)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RucThresholds {
    /// Restante <= este valor => RENEWAL DUE
    pub warning_km: i64,
    /// Restante <= este valor => alerta URGENT
    pub urgent_km: i64,
}

impl Default for RucThresholds {
    fn default() -> Self {
        Self {
            warning_km: 2000,
            urgent_km: 500,
        }
    }
}

/// Credenciales para la API JSON-RPC del host
#[derive(Debug, Clone)]
pub struct GeotabCredentials {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub manifest_url: String,
    pub data_dir: PathBuf,
    pub geotab: Option<GeotabCredentials>,
    pub host_call_timeout: Duration,
    pub manifest_timeout: Duration,
    pub refresh_interval: Duration,
    pub odometer_concurrency: usize,
    pub ruc_rate_per_km: Decimal,
    pub thresholds: RucThresholds,
    /// Pasar a Active al arrancar, sin esperar a `initialize` del host
    pub auto_initialize: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            data_dir: PathBuf::from("data"),
            geotab: None,
            host_call_timeout: Duration::from_secs(15),
            manifest_timeout: Duration::from_secs(20),
            refresh_interval: Duration::from_secs(5 * 60),
            odometer_concurrency: 5,
            ruc_rate_per_km: Decimal::new(76, 3),
            thresholds: RucThresholds::default(),
            auto_initialize: true,
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let geotab = match (
            non_empty_var("GEOTAB_DATABASE"),
            non_empty_var("GEOTAB_USERNAME"),
            non_empty_var("GEOTAB_PASSWORD"),
        ) {
            (Some(database), Some(username), Some(password)) => Some(GeotabCredentials {
                server: non_empty_var("GEOTAB_SERVER").unwrap_or_else(|| "my.geotab.com".to_string()),
                database,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            manifest_url: env::var("MANIFEST_URL").unwrap_or(defaults.manifest_url),
            data_dir: env::var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            geotab,
            host_call_timeout: Duration::from_secs(parse_var("HOST_CALL_TIMEOUT_SECS", 15)?),
            manifest_timeout: Duration::from_secs(parse_var("MANIFEST_TIMEOUT_SECS", 20)?),
            refresh_interval: Duration::from_secs(parse_var::<u64>("REFRESH_INTERVAL_SECS", 300)?.max(1)),
            odometer_concurrency: parse_var::<usize>("ODOMETER_CONCURRENCY", defaults.odometer_concurrency)?.max(1),
            ruc_rate_per_km: parse_var("RUC_RATE_PER_KM", defaults.ruc_rate_per_km)?,
            thresholds: RucThresholds {
                warning_km: parse_var("WARNING_THRESHOLD_KM", defaults.thresholds.warning_km)?,
                urgent_km: parse_var("URGENT_THRESHOLD_KM", defaults.thresholds.urgent_km)?,
            },
            auto_initialize: parse_var("AUTO_INITIALIZE", defaults.auto_initialize)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid value, got '{}'", name, raw))),
        None => Ok(default),
    }
}
