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
    config.security.argon2_memory_cost_kib = 8;
    config.security.argon2_time_cost = 1;

    let state = agora::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    agora::api::router(state)
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header missing")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(
                    header::CONTENT_TYPE,
                    mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
                )
                .body(Body::from(format!("username={username}&password=Abcdef12")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response)
}

async fn give(app: &Router, cookie: &str, body: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile/reputation")
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    body_json(response).await
}

async fn history(app: &Router, cookie: &str, username: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/profile/reputation/{username}"))
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reputation_history_aggregates() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;
    register(&app, "carol").await;

    let json = give(
        &app,
        &alice,
        r#"{"receiver":"bob","amount":5,"reason":"Great thread","threadId":"t-1"}"#,
    )
    .await;
    assert_eq!(json["success"], true);

    let json = give(
        &app,
        &alice,
        r#"{"receiver":"bob","amount":-2,"reason":"Rude comment","commentId":"c-9"}"#,
    )
    .await;
    assert_eq!(json["success"], true);

    let json = give(
        &app,
        &bob,
        r#"{"receiver":"carol","amount":3,"reason":"Helpful answer"}"#,
    )
    .await;
    assert_eq!(json["success"], true);

    let response = history(&app, &bob, "bob").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["user"]["username"], "bob");
    assert_eq!(json["user"]["totalReceived"], 3);
    assert_eq!(json["user"]["totalGiven"], 3);
    assert_eq!(json["user"]["receivedCount"], 2);
    assert_eq!(json["user"]["givenCount"], 1);
    assert_eq!(json["user"]["currentReputation"], 3);

    let received = json["received"].as_array().unwrap();
    assert_eq!(received.len(), 2);
    assert!(received.iter().all(|e| e["giver"] == "alice"));
    let amounts: Vec<i64> = received
        .iter()
        .map(|e| e["amount"].as_i64().unwrap())
        .collect();
    assert!(amounts.contains(&5) && amounts.contains(&-2));

    let given = json["given"].as_array().unwrap();
    assert_eq!(given.len(), 1);
    assert_eq!(given[0]["receiver"], "carol");
    assert_eq!(given[0]["amount"], 3);
}

#[tokio::test]
async fn test_reputation_history_requires_login() {
    let app = spawn_app().await;
    register(&app, "alice").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/profile/reputation/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_reputation_history_unknown_user_is_404() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;

    let response = history(&app, &alice, "ghost").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reputation_validation() {
    let app = spawn_app().await;
    let alice = register(&app, "alice").await;
    register(&app, "bob").await;

    // zero amount
    let json = give(
        &app,
        &alice,
        r#"{"receiver":"bob","amount":0,"reason":"nothing"}"#,
    )
    .await;
    assert_eq!(json["success"], false);

    // missing reason
    let json = give(&app, &alice, r#"{"receiver":"bob","amount":1,"reason":""}"#).await;
    assert_eq!(json["success"], false);

    // self-award
    let json = give(
        &app,
        &alice,
        r#"{"receiver":"alice","amount":5,"reason":"I am great"}"#,
    )
    .await;
    assert_eq!(json["success"], false);

    // unknown receiver
    let json = give(
        &app,
        &alice,
        r#"{"receiver":"ghost","amount":5,"reason":"who dis"}"#,
    )
    .await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "User not found");

    // nothing was recorded
    let response = history(&app, &alice, "bob").await;
    let json = body_json(response).await;
    assert_eq!(json["user"]["receivedCount"], 0);
}
