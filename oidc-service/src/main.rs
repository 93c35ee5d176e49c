use oidc_service::config::OidcConfig;
use oidc_service::models::TenantRegistry;
use oidc_service::services::{ProviderRegistry, RedisService, SessionService, TokenService};
use oidc_service::{build_router, AppState};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = OidcConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting OIDC service"
    );

    let registry = Arc::new(TenantRegistry::from_file(&config.tenant_config_path)?);
    tracing::info!(
        tenants = registry.tenants.len(),
        path = %config.tenant_config_path,
        "Tenant registry loaded"
    );

    let redis = RedisService::new(&config.redis).await?;
    tracing::info!("Redis service initialized");

    let sessions = SessionService::new(Arc::new(redis));
    let tokens = TokenService::new(config.hostname.clone());
    let providers = ProviderRegistry::from_tenants(&registry, reqwest::Client::new()).await?;
    tracing::info!("Credential providers initialized");

    let state = AppState {
        config: config.clone(),
        registry,
        sessions,
        tokens,
        providers,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    // Give in-flight requests 30 seconds to complete
    tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
}
