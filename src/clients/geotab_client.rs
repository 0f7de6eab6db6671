//! Cliente HTTP para la API JSON-RPC de Geotab
//!
//! Autenticación perezosa, sesión en memoria y una sola re-autenticación
//! cuando el host responde `InvalidUserException`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::host_api::HostApi;
use crate::config::GeotabCredentials;
use crate::utils::errors::HostApiError;

/// Credenciales de sesión devueltas por `Authenticate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub database: String,
    pub user_name: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResult {
    credentials: SessionCredentials,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    errors: Vec<RpcErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorDetail {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<RpcError> for HostApiError {
    fn from(error: RpcError) -> Self {
        let detail = error.errors.into_iter().next();
        let name = detail
            .as_ref()
            .and_then(|d| d.name.clone())
            .or(error.name)
            .unwrap_or_else(|| "JSONRPCError".to_string());
        let message = detail
            .and_then(|d| d.message)
            .or(error.message)
            .unwrap_or_default();
        HostApiError::Rpc { name, message }
    }
}

/// Cliente JSON-RPC para el host Geotab
pub struct GeotabClient {
    client: Client,
    credentials: GeotabCredentials,
    server: RwLock<String>,
    session: RwLock<Option<SessionCredentials>>,
}

impl GeotabClient {
    /// Crear nuevo cliente con las credenciales configuradas
    pub fn new(credentials: GeotabCredentials) -> Result<Self, HostApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            server: RwLock::new(credentials.server.clone()),
            credentials,
            session: RwLock::new(None),
        })
    }

    async fn endpoint(&self) -> String {
        let server = self.server.read().await;
        let base = server.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{}/apiv1", base)
        } else {
            format!("https://{}/apiv1", base)
        }
    }

    async fn post(&self, method: &str, params: Value) -> Result<Value, HostApiError> {
        let url = self.endpoint().await;
        log::debug!("🌐 {} -> {}", method, url);

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("❌ Host respondió HTTP {} para {}: {}", status, method, body);
            return Err(HostApiError::Rpc {
                name: format!("HTTP {}", status.as_u16()),
                message: body,
            });
        }

        let text = response.text().await?;
        let rpc: RpcResponse = serde_json::from_str(&text)?;
        if let Some(error) = rpc.error {
            return Err(error.into());
        }
        Ok(rpc.result.unwrap_or(Value::Null))
    }

    /// Autenticar contra el host y guardar la sesión
    pub async fn authenticate(&self) -> Result<SessionCredentials, HostApiError> {
        log::info!(
            "🔐 Autenticando usuario '{}' en base de datos '{}'",
            self.credentials.username,
            self.credentials.database
        );

        let params = json!({
            "database": self.credentials.database,
            "userName": self.credentials.username,
            "password": self.credentials.password,
        });

        let result = self.post("Authenticate", params).await.map_err(|e| match e {
            HostApiError::Rpc { name, message } => HostApiError::Authentication(format!("{}: {}", name, message)),
            other => other,
        })?;
        let auth: AuthenticateResult = serde_json::from_value(result)?;

        if let Some(path) = auth.path.as_deref().filter(|p| !p.is_empty() && *p != "ThisServer") {
            log::info!("🔀 Host redirige la sesión al servidor '{}'", path);
            *self.server.write().await = path.to_string();
        }

        *self.session.write().await = Some(auth.credentials.clone());
        log::info!("✅ Sesión del host establecida");
        Ok(auth.credentials)
    }

    async fn session_credentials(&self) -> Result<SessionCredentials, HostApiError> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(session);
        }
        self.authenticate().await
    }
}

fn with_credentials(mut params: Value, session: &SessionCredentials) -> Result<Value, HostApiError> {
    if params.is_null() {
        params = json!({});
    }
    match params.as_object_mut() {
        Some(map) => {
            map.insert("credentials".to_string(), serde_json::to_value(session)?);
            Ok(params)
        }
        None => Err(HostApiError::Rpc {
            name: "ArgumentException".to_string(),
            message: "host call parameters must be a JSON object".to_string(),
        }),
    }
}

#[async_trait]
impl HostApi for GeotabClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, HostApiError> {
        let session = self.session_credentials().await?;

        match self.post(method, with_credentials(params.clone(), &session)?).await {
            Err(e) if e.is_invalid_session() => {
                log::warn!("🔄 Sesión del host caducada, re-autenticando...");
                *self.session.write().await = None;
                let session = self.authenticate().await?;
                self.post(method, with_credentials(params, &session)?).await
            }
            other => other,
        }
    }
}
