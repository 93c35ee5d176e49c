use super::{CredentialCheck, CredentialProvider};
use crate::models::{ExternalAuth, Mfa, User};
use crate::services::error::ServiceError;
use crate::services::token::decode_jwt_claims_unverified;
use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use aws_sdk_cognitoidentityprovider::Client;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

#[derive(Debug, Deserialize)]
struct CognitoIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Checks credentials against an AWS Cognito user pool using the
/// server-side ADMIN_USER_PASSWORD_AUTH flow. Pool clients with a
/// secret additionally require a per-user SECRET_HASH parameter.
pub struct CognitoProvider {
    client: Client,
    user_pool_id: String,
    client_id: String,
    client_secret: Option<String>,
}

impl CognitoProvider {
    pub async fn new(
        region: &str,
        user_pool_id: String,
        client_id: String,
        client_secret: Option<String>,
    ) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&config),
            user_pool_id,
            client_id,
            client_secret,
        }
    }

    fn secret_hash(&self, username: &str) -> Result<Option<String>, ServiceError> {
        match &self.client_secret {
            Some(secret) => compute_secret_hash(username, &self.client_id, secret).map(Some),
            None => Ok(None),
        }
    }
}

/// SECRET_HASH as Cognito defines it: Base64(HMAC-SHA256(username + client_id))
/// keyed with the pool client's secret.
fn compute_secret_hash(
    username: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ServiceError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(client_secret.as_bytes())
        .map_err(|err| ServiceError::Internal(anyhow::anyhow!("HMAC key setup failed: {err}")))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl CredentialProvider for CognitoProvider {
    #[tracing::instrument(skip(self, password), fields(user_pool_id = %self.user_pool_id))]
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialCheck, ServiceError> {
        let mut request = self
            .client
            .admin_initiate_auth()
            .auth_flow(AuthFlowType::AdminUserPasswordAuth)
            .user_pool_id(&self.user_pool_id)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password);
        if let Some(hash) = self.secret_hash(username)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let output = request.send().await.map_err(|err| {
            let service_err = err.into_service_error();
            if service_err.is_not_authorized_exception()
                || service_err.is_user_not_found_exception()
            {
                tracing::warn!(error = %service_err, "Cognito rejected credentials");
                ServiceError::InvalidCredentials
            } else {
                tracing::error!(error = %service_err, "Cognito authentication failed");
                ServiceError::Upstream("Cognito authentication failed".to_string())
            }
        })?;

        if let Some(result) = output.authentication_result() {
            let id_token = result.id_token().ok_or_else(|| {
                ServiceError::Upstream("Cognito returned no ID token".to_string())
            })?;
            let claims: CognitoIdClaims = decode_jwt_claims_unverified(id_token)?;
            let artifacts = serde_json::json!({
                "access_token": result.access_token(),
                "expires_in": result.expires_in(),
                "token_type": result.token_type(),
                "refresh_token": result.refresh_token(),
                "id_token": result.id_token(),
            });
            return Ok(CredentialCheck::Verified {
                user: User::new(
                    claims.sub,
                    claims.email.unwrap_or_default(),
                    claims.name.unwrap_or_default(),
                    Vec::new(),
                ),
                mfa: Mfa::none(),
                external_auth: Some(ExternalAuth::Cognito { result: artifacts }),
            });
        }

        if let Some(challenge) = output.challenge_name() {
            let parameters = output.challenge_parameters().cloned().unwrap_or_default();
            return Ok(CredentialCheck::Challenge {
                challenge_name: challenge.as_str().to_string(),
                parameters,
            });
        }

        Err(ServiceError::Upstream(
            "Cognito returned neither a result nor a challenge".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_hash_matches_cognito_reference() {
        let hash = compute_secret_hash("jane@acme.com", "pool-client", "top-secret").unwrap();
        assert_eq!(hash, "Al8XNRyQMKojgzF/Yd/1dHSihhfzeqGqG1q7EB/EIAY=");
    }

    #[test]
    fn secret_hash_varies_by_username() {
        let a = compute_secret_hash("jane@acme.com", "pool-client", "top-secret").unwrap();
        let b = compute_secret_hash("john@acme.com", "pool-client", "top-secret").unwrap();
        assert_ne!(a, b);
    }
}
