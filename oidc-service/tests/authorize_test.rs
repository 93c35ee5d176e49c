mod common;

use axum::http::{header, StatusCode};
use common::*;
use oidc_service::models::{AuthState, InitiateLoginState, Mfa, User};
use tower::util::ServiceExt;

#[tokio::test]
async fn authorize_starts_a_flow_and_sets_the_session_cookie() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get(&authorize_uri(
            "test",
            "test-client",
            "https://test.com/callback",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/test/v1/flow/login");

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("authorize should set the session cookie")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/test"));
    assert!(cookie.contains("Max-Age=20000"));
}

#[tokio::test]
async fn authorize_for_unknown_tenant_is_not_found() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get(&authorize_uri(
            "ghost",
            "test-client",
            "https://test.com/callback",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Tenant not found");
}

#[tokio::test]
async fn authorize_for_unknown_client_is_not_found() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get(&authorize_uri(
            "test",
            "nope",
            "https://test.com/callback",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "OIDC client \"nope\" not found"
    );
}

#[tokio::test]
async fn authorize_rejects_an_unregistered_redirect_uri() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get(&authorize_uri(
            "test",
            "test-client",
            "https://evil.com/cb",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // the browser must not be redirected anywhere the client did not register
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(
        body_json(response).await["error"],
        "Invalid redirect URI: https://evil.com/cb, not allowed for the client test-client"
    );
}

#[tokio::test]
async fn authorize_rejects_a_non_code_response_type() {
    let (app, _) = test_app().await;

    let uri = format!(
        "/test/v1/authorize?response_type=token&client_id=test-client\
         &redirect_uri=https%3A%2F%2Ftest.com%2Fcallback&scope=openid\
         &code_challenge={}&code_challenge_method=S256",
        CODE_CHALLENGE
    );
    let response = app.oneshot(get(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn prompt_none_without_a_session_reports_interaction_required() {
    let (app, _) = test_app().await;

    let uri = format!(
        "{}&prompt=none",
        authorize_uri("test", "test-client", "https://test.com/callback")
    );
    let response = app.oneshot(get(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "https://test.com/callback?error=interaction_required&state=test"
    );
    // the session is still established for a later attempt
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn corrupt_session_state_diverts_to_the_error_page() {
    let (app, backend) = test_app().await;
    seed_raw_session(&backend, "sid", "{not json").await;

    let response = app
        .oneshot(get_with_cookie(
            &authorize_uri("test", "test-client", "https://test.com/callback"),
            "session=sid",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/test/v1/flow/error");
}

#[tokio::test]
async fn mid_login_session_diverts_to_the_error_page() {
    let (app, backend) = test_app().await;

    // a session parked between credential check and authentication
    let creds_matched = InitiateLoginState::new(fixture_params(), "test").creds_matched(
        User::new("test_id", "test@test.com", "Test User", vec![]),
        Mfa::none(),
        None,
    );
    seed_session(&backend, "sid", &AuthState::new(creds_matched)).await;

    let response = app
        .oneshot(get_with_cookie(
            &authorize_uri("test", "test-client", "https://test.com/callback"),
            "session=sid",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/test/v1/flow/error");
}
