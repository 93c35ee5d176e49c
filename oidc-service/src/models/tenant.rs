//! Tenant registry - per-tenant OIDC configuration and provider wiring.

use serde::Deserialize;
use service_core::error::AppError;
use std::collections::HashSet;

/// Root of the tenant registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRegistry {
    pub tenants: Vec<Tenant>,
}

impl TenantRegistry {
    /// Load and validate the registry from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("cannot read tenant registry {}: {}", path, e))
        })?;
        let registry: TenantRegistry = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "cannot parse tenant registry {}: {}",
                path,
                e
            ))
        })?;
        registry.validate()?;
        Ok(registry)
    }

    /// Resolve an enabled tenant by id. Disabled tenants are invisible
    /// to every flow.
    pub fn find(&self, tenant_id: &str) -> Option<&Tenant> {
        self.tenants
            .iter()
            .find(|t| t.id == tenant_id && t.enabled)
    }

    fn validate(&self) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for tenant in &self.tenants {
            if !seen.insert(tenant.id.as_str()) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "duplicate tenant id '{}' in registry",
                    tenant.id
                )));
            }
            let mut client_ids = HashSet::new();
            for client in &tenant.oidc_clients {
                if !client_ids.insert(client.client_id.as_str()) {
                    return Err(AppError::ConfigError(anyhow::anyhow!(
                        "duplicate client id '{}' in tenant '{}'",
                        client.client_id,
                        tenant.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Tenant entity. Each tenant owns its signing secret, its identity
/// provider and its registered OIDC clients.
#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub oidc_config: TenantOidcConfig,
    pub auth_provider: AuthProviderConfig,
    pub oidc_clients: Vec<OidcClient>,
}

fn default_enabled() -> bool {
    true
}

impl Tenant {
    pub fn find_client(&self, client_id: &str) -> Option<&OidcClient> {
        self.oidc_clients.iter().find(|c| c.client_id == client_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantOidcConfig {
    /// HS256 secret used to sign tokens issued for this tenant.
    pub jwt_secret: String,
}

/// A client application registered with a tenant. All expiration values
/// are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcClient {
    pub client_id: String,
    pub client_secret: String,
    pub allowed_scopes: Vec<String>,
    pub redirect_uris: Vec<String>,
    pub session_expiration_time: u64,
    pub code_expiration_time: u64,
    pub jwt_expiration_time: u64,
}

impl OidcClient {
    /// Exact-match check against the registered redirect URIs.
    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }
}

/// Identity source backing a tenant, discriminated by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthProviderConfig {
    /// Fixed user list for development and integration tests.
    Test { users: Vec<TestUser> },
    /// Generic OAuth2 password-grant endpoint (Keycloak and friends).
    OauthPasswordGrant {
        url: String,
        client_id: String,
        client_secret: String,
    },
    /// AWS Cognito user pool driven through AdminInitiateAuth.
    Cognito {
        region: String,
        user_pool_id: String,
        client_id: String,
        client_secret: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REGISTRY_JSON: &str = r#"{
        "tenants": [
            {
                "id": "acme",
                "name": "Acme Corp",
                "oidc_config": { "jwt_secret": "acme-secret" },
                "auth_provider": {
                    "type": "test",
                    "users": [
                        { "id": "u1", "name": "A", "username": "a", "email": "a@acme.com", "password": "pw" }
                    ]
                },
                "oidc_clients": [
                    {
                        "client_id": "web",
                        "client_secret": "s3cret",
                        "allowed_scopes": ["openid", "email"],
                        "redirect_uris": ["https://acme.com/cb"],
                        "session_expiration_time": 600,
                        "code_expiration_time": 60,
                        "jwt_expiration_time": 3600
                    }
                ]
            },
            {
                "id": "dormant",
                "name": "Disabled Tenant",
                "enabled": false,
                "oidc_config": { "jwt_secret": "x" },
                "auth_provider": {
                    "type": "oauth_password_grant",
                    "url": "https://idp.example.com/token",
                    "client_id": "cid",
                    "client_secret": "cs"
                },
                "oidc_clients": []
            },
            {
                "id": "cloud",
                "name": "Cognito Tenant",
                "oidc_config": { "jwt_secret": "y" },
                "auth_provider": {
                    "type": "cognito",
                    "region": "us-east-1",
                    "user_pool_id": "us-east-1_abc",
                    "client_id": "pool-client"
                },
                "oidc_clients": []
            }
        ]
    }"#;

    #[test]
    fn parses_all_provider_kinds() {
        let registry: TenantRegistry = serde_json::from_str(REGISTRY_JSON).unwrap();
        assert_eq!(registry.tenants.len(), 3);
        assert!(matches!(
            registry.tenants[0].auth_provider,
            AuthProviderConfig::Test { .. }
        ));
        assert!(matches!(
            registry.tenants[1].auth_provider,
            AuthProviderConfig::OauthPasswordGrant { .. }
        ));
        match &registry.tenants[2].auth_provider {
            AuthProviderConfig::Cognito { client_secret, .. } => {
                assert!(client_secret.is_none());
            }
            other => panic!("expected cognito provider, got {:?}", other),
        }
    }

    #[test]
    fn find_skips_disabled_tenants() {
        let registry: TenantRegistry = serde_json::from_str(REGISTRY_JSON).unwrap();
        assert!(registry.find("acme").is_some());
        assert!(registry.find("dormant").is_none());
        assert!(registry.find("unknown").is_none());
    }

    #[test]
    fn enabled_defaults_to_true() {
        let registry: TenantRegistry = serde_json::from_str(REGISTRY_JSON).unwrap();
        assert!(registry.tenants[0].enabled);
        assert!(!registry.tenants[1].enabled);
    }

    #[test]
    fn redirect_uri_match_is_exact() {
        let registry: TenantRegistry = serde_json::from_str(REGISTRY_JSON).unwrap();
        let client = registry.tenants[0].find_client("web").unwrap();
        assert!(client.allows_redirect_uri("https://acme.com/cb"));
        assert!(!client.allows_redirect_uri("https://acme.com/cb/extra"));
        assert!(!client.allows_redirect_uri("https://acme.com/CB"));
    }

    #[test]
    fn rejects_duplicate_tenant_ids() {
        let json = r#"{
            "tenants": [
                { "id": "t", "name": "A", "oidc_config": { "jwt_secret": "s" },
                  "auth_provider": { "type": "test", "users": [] }, "oidc_clients": [] },
                { "id": "t", "name": "B", "oidc_config": { "jwt_secret": "s" },
                  "auth_provider": { "type": "test", "users": [] }, "oidc_clients": [] }
            ]
        }"#;
        let registry: TenantRegistry = serde_json::from_str(json).unwrap();
        assert!(registry.validate().is_err());
    }

    #[test]
    fn loads_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY_JSON.as_bytes()).unwrap();
        let registry = TenantRegistry::from_file(file.path().to_str().unwrap()).unwrap();
        assert!(registry.find("acme").is_some());
    }

    #[test]
    fn missing_registry_file_is_a_config_error() {
        let result = TenantRegistry::from_file("/nonexistent/tenants.json");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
