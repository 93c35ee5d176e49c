//! Credential providers.
//!
//! One implementation per configured identity-source type, normalizing
//! provider-native results into a common user/evidence shape. Selection
//! is keyed by the tenant's provider config discriminant, so a tenant
//! can never be served by a provider of the wrong kind.

mod cognito;
mod password_grant;

pub use cognito::CognitoProvider;
pub use password_grant::{PasswordGrantProvider, PasswordGrantTokens};
pub use test::TestProvider;

use crate::models::{AuthProviderConfig, ExternalAuth, Mfa, TenantRegistry, User};
use crate::services::error::ServiceError;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a credential check against a tenant's identity source.
#[derive(Debug, Clone)]
pub enum CredentialCheck {
    /// Credentials verified; the user identity is established.
    Verified {
        user: User,
        mfa: Mfa,
        external_auth: Option<ExternalAuth>,
    },
    /// The provider demands further interaction before authentication.
    Challenge {
        challenge_name: String,
        parameters: HashMap<String, String>,
    },
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialCheck, ServiceError>;
}

/// Providers built once at startup, one per tenant.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CredentialProvider>>,
}

impl ProviderRegistry {
    pub async fn from_tenants(
        registry: &TenantRegistry,
        http: reqwest::Client,
    ) -> Result<Self, AppError> {
        let mut providers: HashMap<String, Arc<dyn CredentialProvider>> = HashMap::new();
        for tenant in &registry.tenants {
            let provider: Arc<dyn CredentialProvider> = match &tenant.auth_provider {
                AuthProviderConfig::Test { users } => Arc::new(TestProvider::new(users.clone())),
                AuthProviderConfig::OauthPasswordGrant {
                    url,
                    client_id,
                    client_secret,
                } => Arc::new(PasswordGrantProvider::new(
                    url.clone(),
                    client_id.clone(),
                    client_secret.clone(),
                    http.clone(),
                )),
                AuthProviderConfig::Cognito {
                    region,
                    user_pool_id,
                    client_id,
                    client_secret,
                } => Arc::new(
                    CognitoProvider::new(
                        region,
                        user_pool_id.clone(),
                        client_id.clone(),
                        client_secret.clone(),
                    )
                    .await,
                ),
            };
            tracing::info!(
                tenant_id = %tenant.id,
                provider = %provider_kind(&tenant.auth_provider),
                "credential provider initialized"
            );
            providers.insert(tenant.id.clone(), provider);
        }
        Ok(Self { providers })
    }

    pub fn for_tenant(&self, tenant_id: &str) -> Option<Arc<dyn CredentialProvider>> {
        self.providers.get(tenant_id).cloned()
    }
}

fn provider_kind(config: &AuthProviderConfig) -> &'static str {
    match config {
        AuthProviderConfig::Test { .. } => "test",
        AuthProviderConfig::OauthPasswordGrant { .. } => "oauth_password_grant",
        AuthProviderConfig::Cognito { .. } => "cognito",
    }
}
