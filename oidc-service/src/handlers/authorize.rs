//! Authorization endpoint. Entry point of the authorization code flow.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::AuthorizeQuery;
use crate::handlers::SESSION_COOKIE;
use crate::models::{
    AuthState, AuthStatePatch, AuthStateV1, InitiateLoginState, Prompt, UserAuthenticatedState,
};
use crate::services::ServiceError;
use crate::utils::redirects;
use crate::AppState;

fn session_cookie(tenant_id: &str, session_id: &str, max_age_seconds: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path(format!("/{}", tenant_id))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_seconds as i64))
        .build()
}

/// Start or resume an authorization code flow
///
/// An unauthenticated session is parked at `initiate_login` and sent to
/// the login page. An already authenticated session short-circuits to
/// the client callback with a fresh code, unless `prompt` says otherwise.
#[utoipa::path(
    get,
    path = "/{tenant_id}/v1/authorize",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier"),
        AuthorizeQuery
    ),
    responses(
        (status = 302, description = "Redirect to the login page, the client callback or the error page"),
        (status = 400, description = "Redirect URI not registered or session invalid", body = ErrorResponse),
        (status = 404, description = "Tenant or OIDC client not found", body = ErrorResponse),
        (status = 422, description = "Unsupported prompt", body = ErrorResponse)
    ),
    tag = "OIDC Flow"
)]
#[tracing::instrument(skip(state, jar, query), fields(tenant_id = %tenant_id, client_id = %query.client_id))]
pub async fn authorize(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    jar: CookieJar,
    Query(query): Query<AuthorizeQuery>,
) -> Result<(CookieJar, Response), AppError> {
    let tenant = state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    // A live session pins the flow to the client it started with; the
    // query's client_id only matters for a fresh flow.
    let existing_session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let pre_state = match &existing_session_id {
        Some(session_id) => match state.sessions.get(session_id, &tenant.id).await {
            Ok(loaded) => loaded,
            Err(ServiceError::InvalidSessionState) => {
                tracing::error!("session state unusable, sending the browser to the error page");
                return Ok((jar, redirects::found(&redirects::error_page_path(&tenant.id))));
            }
            Err(e) => return Err(e.into()),
        },
        None => AuthState::idle(),
    };

    let effective_client_id = pre_state
        .auth
        .authorize_params()
        .map(|p| p.client_id.as_str())
        .unwrap_or(&query.client_id);
    let client = tenant.find_client(effective_client_id).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!(
            "OIDC client \"{}\" not found",
            effective_client_id
        ))
    })?;

    if !client.allows_redirect_uri(&query.redirect_uri) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid redirect URI: {}, not allowed for the client {}",
            query.redirect_uri,
            client.client_id
        )));
    }

    let params = query.into_params();

    // First contact: mint the session id and hand the cookie out.
    let (session_id, jar) = match existing_session_id {
        Some(id) => (id, jar),
        None => {
            let id = Uuid::new_v4().to_string();
            state
                .sessions
                .get_or_create(&id, &tenant.id, client.session_expiration_time)
                .await?;
            let cookie = session_cookie(&tenant.id, &id, client.session_expiration_time);
            (id, jar.add(cookie))
        }
    };

    match pre_state.auth {
        AuthStateV1::Idle | AuthStateV1::InitiateLogin(_) => {
            let next = InitiateLoginState::new(params.clone(), &tenant.id);
            state
                .sessions
                .set(
                    &session_id,
                    AuthStatePatch::step(next),
                    Some(client.session_expiration_time),
                )
                .await?;

            if params.prompt == Some(Prompt::None) {
                // prompt=none forbids showing a login page
                let target = redirects::client_error_url(
                    &params.redirect_uri,
                    "interaction_required",
                    params.state.as_deref(),
                );
                return Ok((jar, redirects::found(&target)));
            }
            Ok((jar, redirects::found(&redirects::login_page_path(&tenant.id))))
        }
        AuthStateV1::UserAuthenticated(prev) => {
            // The new request's params replace the stored ones before
            // anything is issued against them.
            let updated = UserAuthenticatedState {
                authorize_params: params.clone(),
                ..prev
            };
            let merged = state
                .sessions
                .set(&session_id, AuthStatePatch::step(updated), None)
                .await?;

            match params.prompt {
                Some(Prompt::Login) => {
                    let next = InitiateLoginState::new(params.clone(), &tenant.id);
                    state
                        .sessions
                        .set(
                            &session_id,
                            AuthStatePatch::step(next),
                            Some(client.session_expiration_time),
                        )
                        .await?;
                    Ok((jar, redirects::found(&redirects::login_page_path(&tenant.id))))
                }
                Some(prompt @ (Prompt::Consent | Prompt::SelectAccount)) => {
                    Err(AppError::UnprocessableEntity(anyhow::anyhow!(
                        "Unsupported prompt: {}",
                        prompt
                    )))
                }
                _ => {
                    let code = state
                        .sessions
                        .create_code(&merged, client.session_expiration_time)
                        .await?;
                    let target = redirects::client_callback_url(
                        &params.redirect_uri,
                        &code,
                        params.state.as_deref(),
                    );
                    Ok((jar, redirects::found(&target)))
                }
            }
        }
        other => {
            // Mid-login steps cannot absorb a new authorize request.
            tracing::error!(step = other.step_name(), "session in unexpected step at authorize");
            Ok((jar, redirects::found(&redirects::error_page_path(&tenant.id))))
        }
    }
}
