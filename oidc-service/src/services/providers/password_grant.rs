use super::{CredentialCheck, CredentialProvider};
use crate::models::{ExternalAuth, Mfa, User};
use crate::services::error::ServiceError;
use crate::services::token::decode_jwt_claims_unverified;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Token response of an OAuth2 Resource Owner Password Credentials grant,
/// in the shape Keycloak and compatible servers return it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordGrantTokens {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
    pub refresh_token: String,
    pub token_type: String,
    #[serde(rename = "not-before-policy")]
    pub not_before_policy: u64,
    pub session_state: String,
    pub scope: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamAccessClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Delegates credential checks to an external IdP's token endpoint via
/// the password grant, then derives the user from the returned access
/// token's claims. The token arrives over the trusted channel we just
/// opened, so its signature is not re-verified here.
pub struct PasswordGrantProvider {
    url: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl PasswordGrantProvider {
    pub fn new(url: String, client_id: String, client_secret: String, http: reqwest::Client) -> Self {
        Self {
            url,
            client_id,
            client_secret,
            http,
        }
    }
}

#[async_trait]
impl CredentialProvider for PasswordGrantProvider {
    #[tracing::instrument(skip(self, password))]
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialCheck, ServiceError> {
        let response = self
            .http
            .post(&self.url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("username", username),
                ("password", password),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, url = %self.url, "password grant request failed");
                ServiceError::Upstream("Password grant failed".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), url = %self.url, "password grant rejected");
            return Err(ServiceError::Upstream("Password grant failed".to_string()));
        }

        let tokens: PasswordGrantTokens = response.json().await.map_err(|err| {
            tracing::error!(error = %err, url = %self.url, "password grant response did not parse");
            ServiceError::Upstream("Password grant returned invalid response".to_string())
        })?;

        user_from_tokens(&tokens)
    }
}

fn user_from_tokens(tokens: &PasswordGrantTokens) -> Result<CredentialCheck, ServiceError> {
    let claims: UpstreamAccessClaims = decode_jwt_claims_unverified(&tokens.access_token)?;
    let permissions = claims
        .scope
        .as_deref()
        .map(|scope| scope.split(' ').map(str::to_string).collect())
        .unwrap_or_default();
    let user = User::new(
        claims.sub,
        claims.email.unwrap_or_default(),
        claims.name.unwrap_or_default(),
        permissions,
    );
    let external_auth = ExternalAuth::OauthPasswordGrant {
        tokens: serde_json::to_value(tokens).map_err(|err| ServiceError::Internal(err.into()))?,
    };

    Ok(CredentialCheck::Verified {
        user,
        mfa: Mfa::none(),
        external_auth: Some(external_auth),
    })
}
