use serde_json::json;

use wordbook_cache::error::ErrorKind;
use wordbook_cache::gateway::Method;
use wordbook_cache::SessionGuard;

mod common;

use common::FakeGateway;

fn user_json(id: i32, username: &str) -> serde_json::Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "display_name": null
    })
}

fn auth_json(id: i32, username: &str, message: &str) -> serde_json::Value {
    json!({ "user": user_json(id, username), "message": message })
}

#[tokio::test]
async fn starts_signed_out() {
    let session = SessionGuard::new(FakeGateway::new());

    assert!(session.current_user().is_none());
    let err = session.require_user().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn login_then_logout() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.respond(Method::Post, "/auth/login", auth_json(1, "mei", "Login successful"));
    gw.respond(Method::Post, "/auth/logout", json!(null));

    let user = session.login("mei", "secret").await.unwrap();
    assert_eq!(user.username, "mei");
    assert_eq!(
        gw.last_call().unwrap().body,
        Some(json!({ "username": "mei", "password": "secret" }))
    );
    assert!(session.is_authenticated());

    session.logout().await.unwrap();
    assert!(session.current_user().is_none());
    assert_eq!(gw.last_call().unwrap().body, None);
}

#[tokio::test]
async fn bad_credentials_leave_session_empty() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.fail(Method::Post, "/auth/login", ErrorKind::InvalidCredentials, 401);

    let err = session.login("mei", "wrong").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidCredentials);
    assert!(session.current_user().is_none());
}

#[tokio::test]
async fn register_signs_in() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.respond(
        Method::Post,
        "/auth/register",
        auth_json(2, "li", "Registration successful"),
    );

    session.register("li", "li@example.com", "pw").await.unwrap();

    assert_eq!(session.require_user().unwrap().id, 2);
}

#[tokio::test]
async fn check_auth_swallows_failures() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.respond_once(Method::Get, "/auth/me", user_json(3, "ana"));
    gw.fail_once(Method::Get, "/auth/me", ErrorKind::Unauthorized, 401);

    assert_eq!(session.check_auth().await.unwrap().id, 3);
    assert!(session.check_auth().await.is_none());
    assert!(session.current_user().is_none());
}

#[tokio::test]
async fn check_auth_accepts_user_without_timestamps() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.respond(
        Method::Get,
        "/auth/me",
        json!({ "id": 3, "username": "ana", "email": "a@x", "display_name": "Ana" }),
    );

    let user = session.check_auth().await.unwrap();

    assert_eq!(user.display_name.as_deref(), Some("Ana"));
    assert!(user.created_at.is_none());
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn login_rejects_bare_user_body() {
    let gw = FakeGateway::new();
    let session = SessionGuard::new(gw.clone());
    gw.respond(Method::Post, "/auth/login", user_json(1, "mei"));

    let err = session.login("mei", "secret").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(session.current_user().is_none());
}
