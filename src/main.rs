use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ruc_license_manager::clients::{GeotabClient, HostApi, OfflineHostApi};
use ruc_license_manager::config::EnvironmentConfig;
use ruc_license_manager::create_router;
use ruc_license_manager::models::LifecycleEvent;
use ruc_license_manager::services::spawn_refresh_scheduler;
use ruc_license_manager::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚛 RUC License Manager");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;

    let host_api: Arc<dyn HostApi> = match config.geotab.clone() {
        Some(credentials) => {
            info!("🔐 Host configurado: {} / {}", credentials.server, credentials.database);
            Arc::new(GeotabClient::new(credentials)?)
        }
        None => {
            warn!("⚠️ Sin credenciales GEOTAB_*: la flota se mostrará sin datos telemáticos");
            Arc::new(OfflineHostApi)
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let auto_initialize = config.auto_initialize;
    let app_state = AppState::new(config, host_api)?;

    if auto_initialize {
        let init_state = app_state.clone();
        tokio::spawn(async move {
            if let Err(e) = init_state.handle_lifecycle(LifecycleEvent::Initialize).await {
                error!("❌ Error en la carga inicial: {}", e);
            }
        });
    }
    let scheduler = spawn_refresh_scheduler(app_state.clone());

    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚗 Flota:");
    info!("   GET  /api/fleet - Snapshot de la flota (JSON)");
    info!("   GET  /api/fleet/table - Tabla HTML");
    info!("   POST /api/fleet/refresh - Refresco completo");
    info!("   GET  /api/fleet/alerts - Alertas de renovación");
    info!("   POST /api/fleet/vehicles/:key/odometer - Leer odómetro");
    info!("   GET  /api/fleet/vehicles/:key/renewal-quote - Opciones de renovación");
    info!("   POST /api/fleet/vehicles/:key/renewals - Renovar RUC");
    info!("   GET  /api/fleet/vehicles/:key/renewals - Historial del vehículo");
    info!("   GET  /api/fleet/renewals - Historial completo");
    info!("🧩 Ciclo de vida del add-in:");
    info!("   POST /api/addin/initialize | /api/addin/focus | /api/addin/blur");
    info!("   GET  /api/addin/state");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    scheduler.abort();
    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
