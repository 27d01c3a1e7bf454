//! HTTP API integration tests.

mod support;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use serde_json::json;

use domain::{MSG_EMAIL_TAKEN, MSG_ROLES_INVALID, MSG_ROLES_REQUIRED};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::routes::create_router;

use crate::support::{
    empty_request, json_request, send, setup_app, setup_state, user_payload, ADMINISTRATOR,
    AUTHOR, EDITOR, SUBSCRIBER,
};

#[tokio::test]
async fn test_api_status_and_health() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, empty_request(Method::GET, "/api")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API is working");

    let (status, body) = send(&app, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_list_roles() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, empty_request(Method::GET, "/api/roles")).await;

    assert_eq!(status, StatusCode::OK);
    let roles = body.as_array().unwrap();
    assert_eq!(roles.len(), 4);
    assert_eq!(roles[0]["name"], "Administrator");
    assert_eq!(roles[3]["id"], SUBSCRIBER);
}

#[tokio::test]
async fn test_user_lifecycle() {
    let (app, _) = setup_app().await;

    let (status, created) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            user_payload("Jane Doe", "jane@example.com", &[EDITOR, AUTHOR]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["full_name"], "Jane Doe");
    assert_eq!(created["roles"].as_array().unwrap().len(), 2);
    assert!(created.get("password").is_none());
    let id = created["id"].as_i64().unwrap();

    let (status, list) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["email"], "jane@example.com");

    let uri = format!("/api/users/{}", id);
    let (status, fetched) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);

    let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, body) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (_, list) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_user_returns_404() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, empty_request(Method::GET, "/api/users/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "User not found");

    let (status, _) = send(&app, empty_request(Method::DELETE, "/api/users/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(Method::PUT, "/api/users/999", json!({ "full_name": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let (app, _) = setup_app().await;
    let payload = user_payload("Jane Doe", "jane@example.com", &[EDITOR]);

    let (status, _) = send(&app, json_request(Method::POST, "/api/users", payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, json_request(Method::POST, "/api/users", payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["email"][0], MSG_EMAIL_TAKEN);

    let (_, list) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_roles_are_required_and_must_exist() {
    let (app, _) = setup_app().await;

    let mut payload = user_payload("No Roles", "none@example.com", &[]);
    let (status, body) = send(&app, json_request(Method::POST, "/api/users", payload.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["roles"][0], MSG_ROLES_REQUIRED);

    payload.as_object_mut().unwrap().remove("roles");
    let (status, body) = send(&app, json_request(Method::POST, "/api/users", payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["roles"][0], MSG_ROLES_REQUIRED);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            user_payload("Bad Role", "bad@example.com", &[EDITOR, 42]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["roles"][0], MSG_ROLES_INVALID);

    let (_, list) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_shape_validation_reports_fields() {
    let (app, _) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            json!({ "email": "not-an-email", "password": "short", "roles": [EDITOR] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields = body["error"]["fields"].as_object().unwrap();
    assert!(fields.contains_key("full_name"));
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
}

#[tokio::test]
async fn test_blank_full_name_is_rejected_on_create() {
    let (app, _) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("   ", "blank@example.com", &[EDITOR])),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["full_name"][0], "The full name field is required.");

    let (_, list) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_full_name_is_rejected_on_update() {
    let (app, state) = setup_app().await;

    let (_, created) = send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("Kept", "kept@example.com", &[EDITOR])),
    )
    .await;
    let id = created["id"].as_i64().unwrap() as i32;

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &format!("/api/users/{}", id), json!({ "full_name": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["fields"]["full_name"].is_array());
    assert_eq!(state.user_service.get_user(id).await.unwrap().full_name, "Kept");
}

#[tokio::test]
async fn test_malformed_json_is_validation_error() {
    let (app, _) = setup_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"full_name\": "))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_replaces_roles_and_keeps_password() {
    let (app, state) = setup_app().await;

    let (_, created) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            user_payload("Bob", "bob@example.com", &[ADMINISTRATOR, EDITOR]),
        ),
    )
    .await;
    let id = created["id"].as_i64().unwrap() as i32;
    let hash_before = state.user_service.get_user(id).await.unwrap().password_hash;

    let (status, updated) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/users/{}", id),
            json!({ "full_name": "Bob Builder", "email": "bob@example.com", "roles": [SUBSCRIBER] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["full_name"], "Bob Builder");
    let role_ids: Vec<i64> = updated["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(role_ids, vec![SUBSCRIBER as i64]);

    let hash_after = state.user_service.get_user(id).await.unwrap().password_hash;
    assert_eq!(hash_before, hash_after);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/users/{}", id),
            json!({ "password": "new-password-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rehashed = state.user_service.get_user(id).await.unwrap().password_hash;
    assert_ne!(hash_before, rehashed);
}

#[tokio::test]
async fn test_update_rejects_email_of_other_user() {
    let (app, _) = setup_app().await;

    send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("A", "a@example.com", &[EDITOR])),
    )
    .await;
    let (_, second) = send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("B", "b@example.com", &[EDITOR])),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/users/{}", second["id"]),
            json!({ "email": "a@example.com" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["email"][0], MSG_EMAIL_TAKEN);
}

#[tokio::test]
async fn test_users_grouped_by_role() {
    let (app, _) = setup_app().await;

    send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            user_payload("Ada", "ada@example.com", &[ADMINISTRATOR, EDITOR]),
        ),
    )
    .await;
    send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("Ben", "ben@example.com", &[EDITOR])),
    )
    .await;

    let (status, body) = send(&app, empty_request(Method::GET, "/api/users/by-role")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Administrator"].as_array().unwrap().len(), 1);
    assert_eq!(body["Editor"].as_array().unwrap().len(), 2);
    assert!(body.get("Author").is_none());
}

#[tokio::test]
async fn test_attach_and_detach_roles() {
    let (app, _) = setup_app().await;

    let (_, created) = send(
        &app,
        json_request(Method::POST, "/api/users", user_payload("Cy", "cy@example.com", &[AUTHOR])),
    )
    .await;
    let uri = format!("/api/users/{}/roles", created["id"]);

    let (status, user) = send(
        &app,
        json_request(Method::POST, &uri, json!({ "roles": [AUTHOR, EDITOR] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["roles"].as_array().unwrap().len(), 2);

    let (status, user) = send(&app, json_request(Method::DELETE, &uri, json!({ "roles": [AUTHOR] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["roles"][0]["id"], EDITOR);

    let (status, body) = send(&app, json_request(Method::POST, &uri, json!({ "roles": [77] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["roles"][0], MSG_ROLES_INVALID);

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/api/users/999/roles", json!({ "roles": [EDITOR] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_csrf_token_required_for_writes() {
    let mut config = UserServiceConfig::for_tests();
    config.csrf.enabled = true;
    let app = create_router(setup_state(config).await);

    let payload = user_payload("Jane", "jane@example.com", &[EDITOR]);

    let (status, body) = send(&app, json_request(Method::POST, "/api/users", payload.clone())).await;
    assert_eq!(status.as_u16(), 419);
    assert_eq!(body["error"]["code"], "CSRF_TOKEN_MISMATCH");

    // Reads pass without a token
    let (status, _) = send(&app, empty_request(Method::GET, "/api/users")).await;
    assert_eq!(status, StatusCode::OK);

    let response = tower::ServiceExt::oneshot(app.clone(), empty_request(Method::GET, "/api/csrf-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("XSRF-TOKEN="));
    let token = set_cookie
        .trim_start_matches("XSRF-TOKEN=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let mut wrong = json_request(Method::POST, "/api/users", payload.clone());
    wrong
        .headers_mut()
        .insert(header::COOKIE, format!("XSRF-TOKEN={}", token).parse().unwrap());
    wrong
        .headers_mut()
        .insert("X-XSRF-TOKEN", "not-the-token".parse().unwrap());
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status.as_u16(), 419);

    let mut request = json_request(Method::POST, "/api/users", payload);
    request
        .headers_mut()
        .insert(header::COOKIE, format!("XSRF-TOKEN={}", token).parse().unwrap());
    request
        .headers_mut()
        .insert("X-XSRF-TOKEN", token.parse().unwrap());
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
}
