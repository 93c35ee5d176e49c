//! Return an already authenticated browser to its client.

use axum::extract::{Path, State};
use axum::response::Response;
use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::handlers::session_id_from_jar;
use crate::models::AuthStateV1;
use crate::services::ServiceError;
use crate::utils::redirects;
use crate::AppState;

/// Re-issue a code for an authenticated session
///
/// Lets a client pick up a fresh authorization code without running the
/// login flow again, as long as the session is still authenticated.
#[utoipa::path(
    get,
    path = "/{tenant_id}/v1/flow/redirect",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier")
    ),
    responses(
        (status = 302, description = "Redirect to the client callback with a code"),
        (status = 400, description = "Session missing or not authenticated", body = ErrorResponse),
        (status = 404, description = "Tenant or OIDC client not found", body = ErrorResponse)
    ),
    tag = "OIDC Flow"
)]
#[tracing::instrument(skip(state, jar), fields(tenant_id = %tenant_id))]
pub async fn redirect_to_client(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let tenant = state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    let session_id = session_id_from_jar(&jar)?;
    let current = state.sessions.get(&session_id, &tenant.id).await?;
    let authenticated = match &current.auth {
        AuthStateV1::UserAuthenticated(step) => step,
        other => {
            tracing::debug!(step = other.step_name(), "redirect requested before authentication");
            return Err(ServiceError::InvalidSessionState.into());
        }
    };

    let client_id = &authenticated.authorize_params.client_id;
    let client = tenant.find_client(client_id).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("OIDC client \"{}\" not found", client_id))
    })?;

    let code = state
        .sessions
        .create_code(&current, client.session_expiration_time)
        .await?;

    let params = &authenticated.authorize_params;
    let target = redirects::client_callback_url(&params.redirect_uri, &code, params.state.as_deref());
    Ok(redirects::found(&target))
}
