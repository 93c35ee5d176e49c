//! Server-rendered pages of the login flow.
//!
//! The login and error surfaces are deliberately bare HTML; tenants are
//! expected to front them with their own branding.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use service_core::error::AppError;
use utoipa::IntoParams;

use crate::AppState;

// ============ Rendering ============

pub fn render_login_page(tenant_id: &str, error: Option<&str>) -> String {
    let error_html = match error {
        Some(message) => format!("\n    <p class=\"error\">{}</p>", escape_html(message)),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Login</title>
  </head>
  <body>
    <h1>Login</h1>
    <form method="post" action="/{tenant_id}/v1/flow/login">
      <label>Email <input type="email" name="email" required></label>
      <label>Password <input type="password" name="password" required></label>
      <button type="submit">Login</button>
    </form>{error_html}
  </body>
</html>
"#,
        tenant_id = escape_html(tenant_id),
        error_html = error_html,
    )
}

pub fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Error</title>
  </head>
  <body>
    <h1>Error</h1>
    <p>{}</p>
  </body>
</html>
"#,
        escape_html(message)
    )
}

/// Minimal HTML escaping for text and attribute positions. The error
/// message comes straight from the query string.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============ Handlers ============

#[derive(Debug, Deserialize, IntoParams)]
pub struct ErrorPageQuery {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Terminal error page of the login flow
#[utoipa::path(
    get,
    path = "/{tenant_id}/v1/flow/error",
    params(
        ("tenant_id" = String, Path, description = "Tenant identifier"),
        ErrorPageQuery
    ),
    responses(
        (status = 200, description = "Error page rendered", body = String, content_type = "text/html"),
        (status = 404, description = "Tenant not found", body = ErrorResponse)
    ),
    tag = "OIDC Flow"
)]
#[tracing::instrument(skip(state, query), fields(tenant_id = %tenant_id))]
pub async fn error_page(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<ErrorPageQuery>,
) -> Result<Html<String>, AppError> {
    state
        .registry
        .find(&tenant_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tenant not found")))?;

    tracing::error!(
        error = query.error.as_deref().unwrap_or("unknown"),
        error_description = query.error_description.as_deref().unwrap_or(""),
        "login flow ended on the error page"
    );

    let message = query.error.as_deref().unwrap_or("Invalid session state");
    Ok(Html(render_error_page(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_posts_back_to_the_tenant_flow() {
        let html = render_login_page("acme", None);
        assert!(html.contains(r#"action="/acme/v1/flow/login""#));
        assert!(html.contains(r#"name="email""#));
        assert!(html.contains(r#"name="password""#));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn login_page_shows_the_error_message() {
        let html = render_login_page("acme", Some("Invalid credentials"));
        assert!(html.contains("Invalid credentials"));
    }

    #[test]
    fn error_message_is_html_escaped() {
        let html = render_error_page("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
