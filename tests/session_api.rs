mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use service_gateway::http::{build_router, AppState};
use service_gateway::registry::RegistryStore;
use service_gateway::session::{IdentityError, MemorySessionStore, SessionStore};

use common::{BrokenSessionStore, StubIdentity};

fn app(state: AppState) -> Router {
    build_router(state, 1024 * 1024, Duration::from_secs(5))
}

fn state(identity: Arc<StubIdentity>, sessions: Arc<dyn SessionStore>) -> AppState {
    common::app_state(Arc::new(RegistryStore::new()), "http://127.0.0.1:1", identity, sessions)
}

fn login(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/session")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_empty_email_is_rejected_without_calling_identity_provider() {
    let identity = StubIdentity::issuing("tok");
    let app = app(state(identity.clone(), Arc::new(MemorySessionStore::new())));

    let response = app
        .oneshot(login(r#"{"email":"","password":"hunter2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, r#"{"message":"Unauthorized"}"#);
    assert_eq!(identity.calls(), 0);
}

#[tokio::test]
async fn test_missing_password_and_garbage_body_are_rejected() {
    let identity = StubIdentity::issuing("tok");
    let app = app(state(identity.clone(), Arc::new(MemorySessionStore::new())));

    for body in [r#"{"email":"a@b.se"}"#, "not json", ""] {
        let response = app.clone().oneshot(login(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body {:?}", body);
    }
    assert_eq!(identity.calls(), 0);
}

#[tokio::test]
async fn test_valid_credentials_set_session_cookie() {
    let identity = StubIdentity::issuing("tok-123");
    let sessions = Arc::new(MemorySessionStore::new());
    let app = app(state(identity.clone(), sessions.clone()));

    let response = app
        .oneshot(login(r#"{"email":"a@b.se","password":"hunter2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert_eq!(body_text(response).await, r#"{"message":"OK"}"#);

    assert_eq!(identity.calls(), 1);
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_cookie_reuses_existing_session() {
    let identity = StubIdentity::issuing("tok-123");
    let sessions = Arc::new(MemorySessionStore::new());
    let app = app(state(identity, sessions.clone()));

    let first = app
        .clone()
        .oneshot(login(r#"{"email":"a@b.se","password":"hunter2"}"#))
        .await
        .unwrap();
    let set_cookie = first.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let mut second = login(r#"{"email":"a@b.se","password":"hunter2"}"#);
    second.headers_mut().insert(header::COOKIE, pair.parse().unwrap());
    let second = app.oneshot(second).await.unwrap();

    assert_eq!(second.status(), StatusCode::OK);
    let again = second.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(again.starts_with(&pair));
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_identity_failures_are_internal_errors_by_default() {
    for failure in [
        (|| IdentityError::Rejected(403)) as fn() -> IdentityError,
        || IdentityError::Upstream(500),
        || IdentityError::Unreachable("connection refused".into()),
    ] {
        let identity = StubIdentity::failing(failure);
        let app = app(state(identity.clone(), Arc::new(MemorySessionStore::new())));

        let response = app
            .oneshot(login(r#"{"email":"a@b.se","password":"wrong"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, r#"{"message":"Unauthorized"}"#);
        assert_eq!(identity.calls(), 1);
    }
}

#[tokio::test]
async fn test_distinguished_identity_errors() {
    let mut rejecting = state(
        StubIdentity::failing(|| IdentityError::Rejected(403)),
        Arc::new(MemorySessionStore::new()),
    );
    rejecting.distinguish_identity_errors = true;
    let response = app(rejecting)
        .oneshot(login(r#"{"email":"a@b.se","password":"wrong"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut failing = state(
        StubIdentity::failing(|| IdentityError::Upstream(500)),
        Arc::new(MemorySessionStore::new()),
    );
    failing.distinguish_identity_errors = true;
    let response = app(failing)
        .oneshot(login(r#"{"email":"a@b.se","password":"hunter2"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_text(response).await, r#"{"message":"Bad Gateway"}"#);
}

#[tokio::test]
async fn test_session_store_failure_is_internal_error() {
    let identity = StubIdentity::issuing("tok");
    let app = app(state(identity, Arc::new(BrokenSessionStore)));

    let response = app
        .oneshot(login(r#"{"email":"a@b.se","password":"hunter2"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_text(response).await, r#"{"message":"Internal Server Error"}"#);
}
