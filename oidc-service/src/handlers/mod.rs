//! HTTP handlers for the OIDC authorization service.

pub mod authorize;
pub mod login;
pub mod pages;
pub mod redirect;
pub mod token;

pub use authorize::*;
pub use login::*;
pub use pages::*;
pub use redirect::*;
pub use token::*;

use axum_extra::extract::CookieJar;
use service_core::error::AppError;

use crate::services::ServiceError;

/// Name of the browser session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Every flow step past authorize requires the session cookie; a missing
/// cookie reads the same as a session in the wrong state.
pub(crate) fn session_id_from_jar(jar: &CookieJar) -> Result<String, AppError> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| ServiceError::InvalidSessionState.into())
}
