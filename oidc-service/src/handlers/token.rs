//! Token endpoint. Exchanges an authorization code for tokens.

use axum::extract::{Path, State};
use axum::Json;
use service_core::error::AppError;

use crate::dtos::{TokenRequest, TokenResponse};
use crate::models::AuthStateV1;
use crate::services::token::verify_pkce;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Exchange an authorization code for tokens
///
/// The code resolves to the session snapshot captured when it was
/// minted. PKCE is mandatory: the verifier must hash to the challenge
/// the flow started with. Codes stay valid until their TTL runs out.
#[utoipa::path(
    post,
    path = "/{tenant_id}/v1/token",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier")
    ),
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 400, description = "Unknown code, state not authenticated or PKCE failure", body = ErrorResponse),
        (status = 404, description = "Tenant not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Token"
)]
#[tracing::instrument(skip(state, req), fields(tenant_id = %tenant_id))]
pub async fn token(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tenant = state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    let snapshot = state.sessions.resolve_code(&req.code).await?;

    // A code minted under one tenant is worthless under another.
    if snapshot.auth.tenant_id() != Some(tenant.id.as_str()) {
        return Err(AppError::TenantMismatch);
    }

    let authenticated = match &snapshot.auth {
        AuthStateV1::UserAuthenticated(step) => step,
        other => {
            tracing::debug!(step = other.step_name(), "code snapshot is not authenticated");
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid state for token creation"
            )));
        }
    };

    let params = &authenticated.authorize_params;
    let client = tenant
        .find_client(&params.client_id)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("OIDC client not found")))?;

    verify_pkce(
        &params.code_challenge_method,
        &params.code_challenge,
        &req.code_verifier,
    )?;

    let issued = state.tokens.issue(
        &tenant.id,
        &tenant.oidc_config.jwt_secret,
        client,
        params,
        &authenticated.user,
    )?;

    Ok(Json(TokenResponse {
        id_token: issued.id_token,
        access_token: issued.access_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        refresh_token: None,
    }))
}
