//! Test helpers for oidc-service integration tests.
//!
//! Tests run the real router against an in-memory session backend; only
//! Redis is mocked out.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use oidc_service::config::{Environment, OidcConfig, RedisConfig, SwaggerConfig, SwaggerMode};
use oidc_service::models::{AuthState, AuthorizeParams, TenantRegistry};
use oidc_service::services::session::{CODE_KEY_PREFIX, SESSION_KEY_PREFIX};
use oidc_service::services::{
    MockSessionBackend, ProviderRegistry, SessionBackend, SessionService, TokenService,
};
use oidc_service::{build_router, AppState};
use service_core::config as core_config;
use std::sync::Arc;

/// PKCE pair used throughout the flow tests.
pub const CODE_VERIFIER: &str = "test_verifier";
/// base64url(SHA256("test_verifier"))
pub const CODE_CHALLENGE: &str = "0Ku4rR8EgR1w3HyHLBCxVLtPsAAks5HOlpmTEt0XhVA";

/// Two tenants backed by static test users. The second tenant exists to
/// prove isolation.
pub const REGISTRY_JSON: &str = r#"{
    "tenants": [
        {
            "id": "test",
            "name": "Test Tenant",
            "oidc_config": { "jwt_secret": "test" },
            "auth_provider": {
                "type": "test",
                "users": [
                    {
                        "id": "test_id",
                        "name": "Test User",
                        "username": "test",
                        "email": "test@test.com",
                        "password": "test"
                    },
                    {
                        "id": "john_id",
                        "name": "John Doe",
                        "username": "john",
                        "email": "john@doe.com",
                        "password": "password123"
                    }
                ]
            },
            "oidc_clients": [
                {
                    "client_id": "test-client",
                    "client_secret": "test-secret",
                    "allowed_scopes": ["openid", "email", "profile"],
                    "redirect_uris": ["https://test.com/callback"],
                    "session_expiration_time": 20000,
                    "code_expiration_time": 20000,
                    "jwt_expiration_time": 20000
                }
            ]
        },
        {
            "id": "other",
            "name": "Other Tenant",
            "oidc_config": { "jwt_secret": "other" },
            "auth_provider": {
                "type": "test",
                "users": [
                    {
                        "id": "other_id",
                        "name": "Other User",
                        "username": "other",
                        "email": "other@other.com",
                        "password": "other"
                    }
                ]
            },
            "oidc_clients": [
                {
                    "client_id": "other-client",
                    "client_secret": "other-secret",
                    "allowed_scopes": ["openid"],
                    "redirect_uris": ["https://other.com/callback"],
                    "session_expiration_time": 20000,
                    "code_expiration_time": 20000,
                    "jwt_expiration_time": 20000
                }
            ]
        }
    ]
}"#;

pub fn fixture_registry() -> TenantRegistry {
    serde_json::from_str(REGISTRY_JSON).expect("fixture registry must parse")
}

fn fixture_config() -> OidcConfig {
    OidcConfig {
        common: core_config::Config { port: 3000 },
        environment: Environment::Dev,
        service_name: "oidc-service".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "error".to_string(),
        hostname: "http://localhost:3000".to_string(),
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
        },
        tenant_config_path: "tenants.json".to_string(),
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        otlp_endpoint: None,
    }
}

pub async fn test_state() -> (AppState, Arc<MockSessionBackend>) {
    let backend = Arc::new(MockSessionBackend::new());
    let registry = Arc::new(fixture_registry());
    let providers = ProviderRegistry::from_tenants(&registry, reqwest::Client::new())
        .await
        .expect("fixture tenants must yield providers");

    let state = AppState {
        config: fixture_config(),
        registry,
        sessions: SessionService::new(backend.clone()),
        tokens: TokenService::new("http://localhost:3000"),
        providers,
    };
    (state, backend)
}

pub async fn test_app() -> (Router, Arc<MockSessionBackend>) {
    let (state, backend) = test_state().await;
    (build_router(state), backend)
}

/// Authorize parameters as the default test flow captures them.
pub fn fixture_params() -> AuthorizeParams {
    AuthorizeParams {
        redirect_uri: "https://test.com/callback".to_string(),
        scope: "openid email profile".to_string(),
        client_id: "test-client".to_string(),
        code_challenge: CODE_CHALLENGE.to_string(),
        code_challenge_method: "S256".to_string(),
        state: Some("test".to_string()),
        prompt: None,
    }
}

// ============ Requests ============

pub fn authorize_uri(tenant_id: &str, client_id: &str, redirect_uri: &str) -> String {
    format!(
        "/{}/v1/authorize?response_type=code&client_id={}&redirect_uri={}\
         &scope=openid%20email%20profile&code_challenge={}&code_challenge_method=S256&state=test",
        tenant_id,
        client_id,
        urlencoding::encode(redirect_uri),
        CODE_CHALLENGE,
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============ Responses ============

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// The `session=<id>` pair from the Set-Cookie header, ready to send
/// back in a Cookie header.
pub fn session_cookie(response: &Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set the session cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}

/// The `code` query parameter of a client callback redirect.
pub fn code_from_location(location: &str) -> String {
    location
        .split("code=")
        .nth(1)
        .expect("location should carry a code")
        .split('&')
        .next()
        .unwrap()
        .to_string()
}

// ============ Seeding ============

/// Plant a raw session record behind a cookie value.
pub async fn seed_raw_session(backend: &MockSessionBackend, session_id: &str, raw: &str) {
    backend
        .set_ex(&format!("{}{}", SESSION_KEY_PREFIX, session_id), raw, 20000)
        .await
        .unwrap();
}

/// Plant a session state behind a cookie value.
pub async fn seed_session(backend: &MockSessionBackend, session_id: &str, state: &AuthState) {
    let raw = serde_json::to_string(state).unwrap();
    seed_raw_session(backend, session_id, &raw).await;
}

/// Plant a code snapshot directly, bypassing the flow.
pub async fn seed_code(backend: &MockSessionBackend, code: &str, state: &AuthState) {
    let raw = serde_json::to_string(state).unwrap();
    backend
        .set_ex(&format!("{}{}", CODE_KEY_PREFIX, code), &raw, 20000)
        .await
        .unwrap();
}

// ============ Tokens ============

/// Decode and verify a token issued by the service under test.
pub fn decode_claims(token: &str, secret: &str, audience: &str) -> serde_json::Value {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_audience(&[audience]);
    jsonwebtoken::decode::<serde_json::Value>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .expect("token should verify under the tenant secret")
    .claims
}
