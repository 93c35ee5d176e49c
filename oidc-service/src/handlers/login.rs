//! Login page and credential submission.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::dtos::LoginRequest;
use crate::handlers::pages::render_login_page;
use crate::handlers::session_id_from_jar;
use crate::models::{AuthStatePatch, AuthStateV1};
use crate::services::providers::CredentialCheck;
use crate::services::ServiceError;
use crate::utils::redirects;
use crate::utils::ValidatedForm;
use crate::AppState;

/// Render the login form
///
/// Only reachable while the session sits at `initiate_login`; anything
/// else means the browser arrived here outside a flow.
#[utoipa::path(
    get,
    path = "/{tenant_id}/v1/flow/login",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier")
    ),
    responses(
        (status = 200, description = "Login page rendered", body = String, content_type = "text/html"),
        (status = 400, description = "Session missing or in the wrong state", body = ErrorResponse),
        (status = 404, description = "Tenant not found", body = ErrorResponse)
    ),
    tag = "OIDC Flow"
)]
#[tracing::instrument(skip(state, jar), fields(tenant_id = %tenant_id))]
pub async fn login_page(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    jar: CookieJar,
) -> Result<Html<String>, AppError> {
    let tenant = state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    let session_id = session_id_from_jar(&jar)?;
    let current = state.sessions.get(&session_id, &tenant.id).await?;
    if !matches!(current.auth, AuthStateV1::InitiateLogin(_)) {
        tracing::debug!(step = current.auth.step_name(), "login page requested out of order");
        return Err(ServiceError::InvalidSessionState.into());
    }

    Ok(Html(render_login_page(&tenant.id, None)))
}

/// Submit credentials for the pending flow
///
/// On success the session walks `user_creds_match` then
/// `user_authenticated`, a code is minted and the browser is sent back
/// to the client. Failed credentials re-render the form with an error
/// and leave the session untouched.
#[utoipa::path(
    post,
    path = "/{tenant_id}/v1/flow/login",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier")
    ),
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Redirect to the client callback with a code"),
        (status = 400, description = "Session missing or in the wrong state", body = ErrorResponse),
        (status = 401, description = "Invalid credentials, login page re-rendered", body = String, content_type = "text/html"),
        (status = 404, description = "Tenant not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "OIDC Flow"
)]
#[tracing::instrument(skip(state, jar, form), fields(tenant_id = %tenant_id, email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    jar: CookieJar,
    ValidatedForm(form): ValidatedForm<LoginRequest>,
) -> Result<Response, AppError> {
    let tenant = state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    let session_id = session_id_from_jar(&jar)?;
    let current = state.sessions.get(&session_id, &tenant.id).await?;
    let prev = match current.auth {
        AuthStateV1::InitiateLogin(step) => step,
        other => {
            tracing::debug!(step = other.step_name(), "credentials posted out of order");
            return Err(ServiceError::InvalidSessionState.into());
        }
    };

    // Session TTLs and the code TTL come from the client the flow was
    // started for.
    let client = tenant
        .find_client(&prev.authorize_params.client_id)
        .ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("OIDC client not found for the session"))
        })?;
    let provider = state.providers.for_tenant(&tenant.id).ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("No credential provider for the tenant"))
    })?;

    let check = match provider.authenticate(&form.email, &form.password).await {
        Ok(check) => check,
        Err(e) => {
            tracing::warn!(error = %e, "credential check failed");
            let page = render_login_page(&tenant.id, Some("Invalid credentials"));
            return Ok((StatusCode::UNAUTHORIZED, Html(page)).into_response());
        }
    };

    match check {
        CredentialCheck::Challenge { challenge_name, .. } => {
            tracing::info!(challenge = %challenge_name, "provider requires a challenge");
            Ok(redirects::found(&redirects::mfa_page_path(&tenant.id)))
        }
        CredentialCheck::Verified {
            user,
            mfa,
            external_auth,
        } => {
            let params = prev.authorize_params.clone();
            let matched = prev.creds_matched(user, mfa, external_auth);
            state
                .sessions
                .set(&session_id, AuthStatePatch::step(matched.clone()), None)
                .await?;

            let authenticated = matched.authenticated();
            let terminal = state
                .sessions
                .set(&session_id, AuthStatePatch::step(authenticated), None)
                .await?;

            let code = state
                .sessions
                .create_code(&terminal, client.session_expiration_time)
                .await?;
            let target =
                redirects::client_callback_url(&params.redirect_uri, &code, params.state.as_deref());
            Ok(redirects::found(&target))
        }
    }
}
