pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Json, Router};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, OidcConfig, SwaggerMode};
use crate::models::TenantRegistry;
use crate::services::{ProviderRegistry, SessionService, TokenService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::authorize::authorize,
        handlers::login::login_page,
        handlers::login::login,
        handlers::redirect::redirect_to_client,
        handlers::pages::error_page,
        handlers::token::token,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::LoginRequest,
            dtos::TokenRequest,
            dtos::TokenResponse,
            dtos::ResponseType,
            dtos::GrantType,
            models::Prompt,
        )
    ),
    tags(
        (name = "OIDC Flow", description = "Authorization code flow with PKCE"),
        (name = "Token", description = "Token issuance"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: OidcConfig,
    pub registry: Arc<TenantRegistry>,
    pub sessions: SessionService,
    pub tokens: TokenService,
    pub providers: ProviderRegistry,
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new().route("/health", get(health_check));

    // Swagger is always on in dev; prod exposes it only when asked to.
    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => state.config.swagger.enabled == SwaggerMode::Enabled,
    };

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Keep the OpenAPI JSON available for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let dev_mode = state.config.environment == Environment::Dev;

    let mut app = app
        .route("/:tenant_id/v1/authorize", get(handlers::authorize))
        .route(
            "/:tenant_id/v1/flow/login",
            get(handlers::login_page).post(handlers::login),
        )
        .route(
            "/:tenant_id/v1/flow/redirect",
            get(handlers::redirect_to_client),
        )
        .route("/:tenant_id/v1/flow/error", get(handlers::error_page))
        .route("/:tenant_id/v1/token", post(handlers::token))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware));

    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.sessions.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::InternalError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "redis": "up"
        }
    })))
}
