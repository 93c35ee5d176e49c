use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{AuthorizeParams, Prompt};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid session state")]
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
}

/// Query parameters of the authorize endpoint. `response_type` is
/// accepted only as `code`; parsing rejects anything else.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuthorizeQuery {
    #[param(example = "code")]
    pub response_type: ResponseType,
    #[param(example = "test-client")]
    pub client_id: String,
    #[param(example = "https://test.com/callback")]
    pub redirect_uri: String,
    #[param(example = "openid profile email")]
    pub scope: String,
    pub code_challenge: String,
    #[param(example = "S256")]
    pub code_challenge_method: String,
    pub state: Option<String>,
    pub prompt: Option<Prompt>,
}

impl AuthorizeQuery {
    pub fn into_params(self) -> AuthorizeParams {
        AuthorizeParams {
            redirect_uri: self.redirect_uri,
            scope: self.scope,
            client_id: self.client_id,
            code_challenge: self.code_challenge,
            code_challenge_method: self.code_challenge_method,
            state: self.state,
            prompt: self.prompt,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "test@test.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "test")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[schema(example = "authorization_code")]
    pub grant_type: GrantType,

    #[validate(length(min = 1, message = "Code is required"))]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub code: String,

    #[validate(length(min = 1, message = "Code verifier is required"))]
    #[schema(example = "test_verifier")]
    pub code_verifier: String,
}

/// Token endpoint response. `refresh_token` is always present and always
/// null; refresh tokens are not issued.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 20000)]
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}
