use crate::models::{AuthorizeParams, CODE_CHALLENGE_METHOD_S256, OidcClient, User};
use crate::services::error::ServiceError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Scopes with reserved OIDC meaning. They shape ID token claims and are
/// never forwarded into an access token's scope claim.
const OIDC_RESERVED_SCOPES: [&str; 6] = [
    "openid",
    "email",
    "profile",
    "phone",
    "address",
    "offline_access",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: Vec<String>,
}

/// Outcome of token issuance. Which tokens exist depends purely on the
/// requested scope set.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub expires_in: u64,
}

/// Signs per-tenant ID and access tokens.
#[derive(Clone)]
pub struct TokenService {
    hostname: String,
}

impl TokenService {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// Issue tokens for an authenticated user against a client.
    ///
    /// An ID token is issued when `openid` was requested. An access
    /// token is issued when any non-openid scope was requested; its
    /// scope claim is the requested set intersected with the client's
    /// allowed scopes and the user's permissions, minus reserved OIDC
    /// scopes. The intersection may legitimately be empty.
    #[tracing::instrument(skip(self, jwt_secret, client, user), fields(tenant_id = %tenant_id, client_id = %client.client_id))]
    pub fn issue(
        &self,
        tenant_id: &str,
        jwt_secret: &str,
        client: &OidcClient,
        params: &AuthorizeParams,
        user: &User,
    ) -> Result<IssuedTokens, ServiceError> {
        let requested = ordered_scope_set(&params.scope);
        let has_openid = requested.contains(&"openid");

        let now = chrono::Utc::now().timestamp();
        let expires_in = client.jwt_expiration_time;
        let exp = now + expires_in as i64;
        let issuer = format!("{}/{}", self.hostname, tenant_id);
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(jwt_secret.as_bytes());

        let id_token = if has_openid {
            let claims = IdTokenClaims {
                iss: issuer.clone(),
                sub: user.id.clone(),
                aud: client.client_id.clone(),
                iat: now,
                exp,
                email: requested
                    .contains(&"email")
                    .then(|| user.email.clone()),
                name: requested
                    .contains(&"profile")
                    .then(|| user.name.clone()),
            };
            Some(jsonwebtoken::encode(&header, &claims, &key)?)
        } else {
            None
        };

        let non_openid_requested = requested.len() > usize::from(has_openid);
        let access_token = if non_openid_requested {
            let scope: Vec<String> = requested
                .iter()
                .copied()
                .filter(|s| *s != "openid")
                .filter(|s| client.allowed_scopes.iter().any(|a| a.as_str() == *s))
                .filter(|s| user.permissions.iter().any(|p| p.as_str() == *s))
                .filter(|s| !OIDC_RESERVED_SCOPES.contains(s))
                .map(str::to_string)
                .collect();
            let claims = AccessTokenClaims {
                iss: issuer,
                sub: user.id.clone(),
                aud: client.client_id.clone(),
                iat: now,
                exp,
                scope,
            };
            Some(jsonwebtoken::encode(&header, &claims, &key)?)
        } else {
            None
        };

        Ok(IssuedTokens {
            id_token,
            access_token,
            expires_in,
        })
    }
}

/// Validate a PKCE verifier against the challenge captured at authorize
/// time. Only S256 is accepted; the values are not secret, so plain
/// string equality suffices.
pub fn verify_pkce(method: &str, challenge: &str, verifier: &str) -> Result<(), ServiceError> {
    if method != CODE_CHALLENGE_METHOD_S256 {
        return Err(ServiceError::InvalidCodeChallengeMethod);
    }
    let digest = Sha256::digest(verifier.as_bytes());
    let computed = URL_SAFE_NO_PAD.encode(digest);
    if computed != challenge {
        return Err(ServiceError::CodeVerifierMismatch);
    }
    Ok(())
}

/// Extract claims from an upstream-issued JWT without verifying its
/// signature. Providers hand us tokens whose keys we do not hold; the
/// claims are trusted as delivered.
pub fn decode_jwt_claims_unverified<T: serde::de::DeserializeOwned>(
    token: &str,
) -> Result<T, ServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let data = jsonwebtoken::decode::<T>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Space-split scope string as a set preserving first-occurrence order.
fn ordered_scope_set(scope: &str) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for s in scope.split(' ') {
        if !seen.contains(&s) {
            seen.push(s);
        }
    }
    seen
}
