use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use agora::config::Config;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;
    // Cheapest valid Argon2 params so tests stay fast
    config.security.argon2_memory_cost_kib = 8;
    config.security.argon2_time_cost = 1;

    let state = agora::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    agora::api::router(state)
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Extracts "session=<token>" from the Set-Cookie header.
fn session_cookie(response: &axum::response::Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header missing")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}

async fn register(app: &Router, username: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(form_request(
            "/api/auth/register",
            &format!("username={username}&password={password}"),
        ))
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_register_sets_cookie_and_redirects_home() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Abcdef12").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(raw_cookie.starts_with("session="));
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("SameSite=Lax"));
    assert!(raw_cookie.contains("Path=/"));
    // secure_cookies is off in the test config
    assert!(!raw_cookie.contains("Secure"));

    // The fresh session resolves to the new user
    let cookie = session_cookie(&response);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["authenticatedUser"]["username"], "alice");
    assert_eq!(json["authenticatedUser"]["role"], "REGULAR");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Abcdef12").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = register(&app, "alice", "Xyzabc34").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Username is already in use");
}

#[tokio::test]
async fn test_registration_input_validation() {
    let app = spawn_app().await;

    // weak password: no uppercase
    let response = register(&app, "bob", "abcdef12").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // too short
    let response = register(&app, "bob", "Abc12").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // username with invalid characters
    let response = register(&app, "bob!", "Abcdef12").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // none of the attempts created a user
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-user/bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_round_trip() {
    let app = spawn_app().await;
    register(&app, "alice", "Abcdef12").await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/api/auth/login",
            "username=alice&password=Abcdef12",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["authenticatedUser"]["username"], "alice");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_uniformly() {
    let app = spawn_app().await;
    register(&app, "alice", "Abcdef12").await;

    // Wrong password and unknown user produce the same message
    let response = app
        .clone()
        .oneshot(form_request(
            "/api/auth/login",
            "username=alice&password=Wrong1234",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/api/auth/login",
            "username=nobody&password=Wrong1234",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(response).await;

    assert_eq!(wrong_password["error"], "Incorrect username or password");
    assert_eq!(wrong_password["error"], unknown_user["error"]);
}

#[tokio::test]
async fn test_auth_status_without_cookie_is_logged_out() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["authenticatedUser"].is_null());
}

#[tokio::test]
async fn test_logout_clears_cookie_and_session() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Abcdef12").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let raw_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(raw_cookie.starts_with("session=;"));
    assert!(raw_cookie.contains("Max-Age=0"));

    // The session row is gone: presenting the old token no longer works
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert!(json["authenticatedUser"].is_null());

    // A second logout with the same stale cookie is a no-op, not an error
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_get_user_projection_and_not_found() {
    let app = spawn_app().await;
    register(&app, "alice", "Abcdef12").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-user/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["role"], "REGULAR");
    assert!(json["createdAt"].is_string());
    // the password hash is never exposed
    assert!(json.get("passwordHash").is_none());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-user/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_listing_pagination_and_search() {
    let app = spawn_app().await;
    for name in ["carol", "carla", "dave"] {
        register(&app, name, "Abcdef12").await;
    }

    // Seeded admin + three registrations
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-users?page=1&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["users"].as_array().unwrap().len(), 2);
    assert_eq!(json["pagination"]["currentPage"], 1);
    assert_eq!(json["pagination"]["pageSize"], 2);
    assert_eq!(json["pagination"]["totalUsers"], 4);
    assert_eq!(json["pagination"]["totalPages"], 2);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-users?search=car")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let users = json["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(
        users
            .iter()
            .all(|u| u["username"].as_str().unwrap().contains("car"))
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-users?limit=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_username() {
    let app = spawn_app().await;
    let response = register(&app, "alice", "Abcdef12").await;
    let cookie = session_cookie(&response);

    // Not logged in: message, not a redirect
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/change-username")
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    r#"{"oldUsername":"alice","newUsername":"alicia"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);

    // Owner can rename
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/change-username")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    r#"{"oldUsername":"alice","newUsername":"alicia"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    // Old name is free, new name resolves
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-user/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/get-user/alicia")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_change_username_rejects_non_owner_and_taken_names() {
    let app = spawn_app().await;
    register(&app, "alice", "Abcdef12").await;
    let response = register(&app, "bob", "Abcdef12").await;
    let bob_cookie = session_cookie(&response);

    // Bob cannot rename Alice
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/change-username")
                .header(header::COOKIE, &bob_cookie)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    r#"{"oldUsername":"alice","newUsername":"mallory"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "You are not authorized to change this username"
    );

    // Bob cannot take Alice's name
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/change-username")
                .header(header::COOKIE, &bob_cookie)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(r#"{"oldUsername":"bob","newUsername":"alice"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Username is already taken");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
