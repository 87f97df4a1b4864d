use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;
use axum::Router;
use backup_api::api::{build_router, ApiState};
use backup_api::auth::{LoginService, TokenService};
use backup_api::domain::{User, UserId, UserRole};
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

use crate::support::{
    backend, get, json_body, request, CountingTokenService, InMemoryUserRepository, ManualClock,
    PlainPasswordVerifier,
};

struct App {
    router: Router,
    tokens: Arc<CountingTokenService>,
    users: Arc<InMemoryUserRepository>,
    admin: User,
    member: User,
}

fn user_with_uuid(username: &str, role: UserRole) -> User {
    let mut user = crate::support::user(username, role);
    user.id = UserId::new();
    user
}

fn app() -> App {
    let clock = ManualClock::starting_now();
    let tokens = CountingTokenService::new(backend("jwt", &clock, Duration::hours(1)));
    let admin = user_with_uuid("root", UserRole::Admin);
    let member = user_with_uuid("member", UserRole::Member);
    let users = InMemoryUserRepository::with_users(vec![
        (admin.clone(), "plain:root-password".to_string()),
        (member.clone(), "plain:member-password".to_string()),
    ]);

    let shared: Arc<dyn TokenService> = tokens.clone();
    let login = Arc::new(LoginService::new(
        users.clone(),
        Arc::new(PlainPasswordVerifier::default()),
        shared.clone(),
    ));
    let state = ApiState { tokens: shared, users: users.clone(), login };

    App { router: build_router(state), tokens, users, admin, member }
}

fn post_json(uri: &str, bearer: Option<&str>, body: serde_json::Value) -> axum::http::Request<Body> {
    request("POST", uri, bearer, Body::from(body.to_string()))
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let response = app.router.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.tokens.verify_calls(), 0);
}

#[tokio::test]
async fn login_returns_token_envelope() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json("/login", None, json!({"username": "root", "password": "root-password"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], 200);
    let token = body["data"]["access_token"].as_str().unwrap();
    assert_eq!(app.tokens.verify(token).unwrap().user_id, app.admin.id);
}

#[tokio::test]
async fn login_with_bad_credentials_is_401() {
    let app = app();
    let response = app
        .router
        .oneshot(post_json("/login", None, json!({"username": "root", "password": "nope"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "ERR_INVALID_CREDENTIALS");
}

#[tokio::test]
async fn login_with_malformed_body_is_400() {
    let app = app();
    for body in [json!({"username": ""}), json!({"username": "", "password": "x"})] {
        let response = app.router.clone().oneshot(post_json("/login", None, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "ERR_BAD_REQUEST");
    }
}

#[tokio::test]
async fn user_lookup_requires_a_token() {
    let app = app();
    let uri = format!("/users/{}", app.member.id);

    let anonymous = app.router.clone().oneshot(get(&uri, None)).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let token = app.tokens.issue(&app.member).unwrap();
    let response = app.router.clone().oneshot(get(&uri, Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["username"], "member");
}

#[tokio::test]
async fn unknown_user_is_404_and_bad_id_is_400() {
    let app = app();
    let token = app.tokens.issue(&app.member).unwrap();

    let missing = format!("/users/{}", UserId::new());
    let response = app.router.clone().oneshot(get(&missing, Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.router.clone().oneshot(get("/users/not-a-uuid", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_users_is_admin_only() {
    let app = app();
    let member_token = app.tokens.issue(&app.member).unwrap();
    let admin_token = app.tokens.issue(&app.admin).unwrap();

    let forbidden =
        app.router.clone().oneshot(get("/users?page=1&limit=10", Some(&member_token))).await.unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(forbidden).await["error"], "ERR_FORBIDDEN");

    let allowed =
        app.router.clone().oneshot(get("/users?page=1&limit=10", Some(&admin_token))).await.unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(json_body(allowed).await["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_users_is_admin_only() {
    let app = app();
    let uri = format!("/users/{}", app.member.id);
    let member_token = app.tokens.issue(&app.member).unwrap();
    let admin_token = app.tokens.issue(&app.admin).unwrap();

    let forbidden = app
        .router
        .clone()
        .oneshot(request("DELETE", &uri, Some(&member_token), Body::empty()))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.users.len(), 2);

    let deleted = app
        .router
        .clone()
        .oneshot(request("DELETE", &uri, Some(&admin_token), Body::empty()))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(app.users.len(), 1);
}

fn put_json(uri: &str, bearer: &str, body: serde_json::Value) -> axum::http::Request<Body> {
    request("PUT", uri, Some(bearer), Body::from(body.to_string()))
}

#[tokio::test]
async fn role_is_a_snapshot_taken_at_issuance() {
    let app = app();
    let admin_token = app.tokens.issue(&app.admin).unwrap();
    let uri = format!("/users/{}", app.admin.id);

    let demoted = app
        .router
        .clone()
        .oneshot(put_json(&uri, &admin_token, json!({"role": "member"})))
        .await
        .unwrap();
    assert_eq!(demoted.status(), StatusCode::OK);
    assert_eq!(json_body(demoted).await["data"]["role"], "member");

    // The token issued before the demotion still carries the admin role.
    let stale = app.router.clone().oneshot(get("/users", Some(&admin_token))).await.unwrap();
    assert_eq!(stale.status(), StatusCode::OK);

    let relogin = app
        .router
        .clone()
        .oneshot(post_json("/login", None, json!({"username": "root", "password": "root-password"})))
        .await
        .unwrap();
    let fresh_token = json_body(relogin).await["data"]["access_token"].as_str().unwrap().to_string();

    let fresh = app.router.clone().oneshot(get("/users", Some(&fresh_token))).await.unwrap();
    assert_eq!(fresh.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn members_update_their_own_profile() {
    let app = app();
    let token = app.tokens.issue(&app.member).unwrap();
    let uri = format!("/users/{}", app.member.id);

    let response = app
        .router
        .clone()
        .oneshot(put_json(&uri, &token, json!({"email": "new-member@example.com"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["email"], "new-member@example.com");
    assert_eq!(body["data"]["username"], "member");
    assert_eq!(body["data"]["role"], "member");
}

#[tokio::test]
async fn members_cannot_touch_other_users_or_roles() {
    let app = app();
    let token = app.tokens.issue(&app.member).unwrap();

    let other = format!("/users/{}", app.admin.id);
    let response = app
        .router
        .clone()
        .oneshot(put_json(&other, &token, json!({"email": "hijack@example.com"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let own = format!("/users/{}", app.member.id);
    let response =
        app.router.clone().oneshot(put_json(&own, &token, json!({"role": "admin"}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let member_token = app.tokens.issue(&app.member).unwrap();
    let still_member =
        app.router.clone().oneshot(get("/users", Some(&member_token))).await.unwrap();
    assert_eq!(still_member.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn taken_username_or_email_is_409() {
    let app = app();
    let token = app.tokens.issue(&app.admin).unwrap();
    let uri = format!("/users/{}", app.member.id);

    for body in [json!({"username": "root"}), json!({"email": "root@example.com"})] {
        let response = app.router.clone().oneshot(put_json(&uri, &token, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "ERR_CONFLICTING_DATA");
    }
}

#[tokio::test]
async fn update_rejects_bad_input() {
    let app = app();
    let token = app.tokens.issue(&app.admin).unwrap();

    let bad_id =
        app.router.clone().oneshot(put_json("/users/42", &token, json!({}))).await.unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

    let missing = format!("/users/{}", UserId::new());
    let response =
        app.router.clone().oneshot(put_json(&missing, &token, json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/users/{}", app.member.id);
    for body in [json!({"email": "nope"}), json!({"password": "short"}), json!({"role": "root"})] {
        let response = app.router.clone().oneshot(put_json(&uri, &token, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let anonymous = app
        .router
        .clone()
        .oneshot(request("PUT", &uri, None, Body::from(json!({}).to_string())))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_is_rehashed() {
    let app = app();
    let token = app.tokens.issue(&app.member).unwrap();
    let uri = format!("/users/{}", app.member.id);

    let response = app
        .router
        .clone()
        .oneshot(put_json(&uri, &token, json!({"password": "a-brand-new-password"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await["data"].get("password_hash").is_none());

    let stored = app.users.password_hash_of("member").unwrap();
    assert!(stored.starts_with("$argon2id$"));
}

#[tokio::test]
async fn members_cannot_register_admins() {
    let app = app();
    let member_token = app.tokens.issue(&app.member).unwrap();
    let body = json!({
        "username": "eve",
        "email": "eve@example.com",
        "password": "long-enough-password",
        "role": "admin"
    });

    let response =
        app.router.clone().oneshot(post_json("/register", Some(&member_token), body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.users.len(), 2);
}

#[tokio::test]
async fn admins_can_register_users() {
    let app = app();
    let admin_token = app.tokens.issue(&app.admin).unwrap();
    let body = json!({
        "username": "frank",
        "email": "frank@example.com",
        "password": "long-enough-password",
        "role": "member"
    });

    let response =
        app.router.clone().oneshot(post_json("/register", Some(&admin_token), body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["role"], "member");
    assert!(body["data"].get("password_hash").is_none());
    assert_eq!(app.users.len(), 3);
}
