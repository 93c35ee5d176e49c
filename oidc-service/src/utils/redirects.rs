//! Flow redirect helpers.
//!
//! The OAuth flow answers plain `302 Found`; axum's `Redirect` only
//! offers 303/307/308, so the response is assembled directly.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

pub fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

pub fn login_page_path(tenant_id: &str) -> String {
    format!("/{tenant_id}/v1/flow/login")
}

pub fn mfa_page_path(tenant_id: &str) -> String {
    format!("/{tenant_id}/v1/flow/mfa")
}

pub fn error_page_path(tenant_id: &str) -> String {
    format!("/{tenant_id}/v1/flow/error")
}

/// Success redirect back to the client: `redirect_uri?code=...` with the
/// caller's `state` echoed verbatim when present.
pub fn client_callback_url(redirect_uri: &str, code: &str, state: Option<&str>) -> String {
    let mut url = format!("{}?code={}", redirect_uri, urlencoding::encode(code));
    if let Some(state) = state {
        url.push_str(&format!("&state={}", urlencoding::encode(state)));
    }
    url
}

/// Error redirect back to the client, e.g. `error=interaction_required`.
pub fn client_error_url(redirect_uri: &str, error: &str, state: Option<&str>) -> String {
    let mut url = format!("{}?error={}", redirect_uri, urlencoding::encode(error));
    if let Some(state) = state {
        url.push_str(&format!("&state={}", urlencoding::encode(state)));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_sets_location_and_302() {
        let response = found("/test/v1/flow/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/test/v1/flow/login"
        );
    }

    #[test]
    fn callback_url_echoes_state() {
        let url = client_callback_url("https://test.com/callback", "abc-123", Some("xy z"));
        assert_eq!(url, "https://test.com/callback?code=abc-123&state=xy%20z");
    }

    #[test]
    fn callback_url_omits_absent_state() {
        let url = client_callback_url("https://test.com/callback", "abc-123", None);
        assert_eq!(url, "https://test.com/callback?code=abc-123");
    }

    #[test]
    fn error_url_carries_error_code() {
        let url = client_error_url("https://test.com/callback", "interaction_required", None);
        assert_eq!(
            url,
            "https://test.com/callback?error=interaction_required"
        );
    }
}
