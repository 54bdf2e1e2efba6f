mod support;

use axum::http::StatusCode;
use axum_test::{TestServer, multipart::MultipartForm};
use serde_json::{Value, json};
use support::{bearer, register_and_login, spawn_app};

async fn create_listing(server: &TestServer, token: &str) -> i64 {
    let (name, value) = bearer(token);
    let form = MultipartForm::new()
        .add_text("title", "Tent")
        .add_text("description", "Two person tent")
        .add_text("price", "15")
        .add_text("is_rental", "yes");

    let response = server
        .post("/api/listings")
        .add_header(name, value)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

async fn send(server: &TestServer, token: &str, body: Value) -> axum_test::TestResponse {
    let (name, value) = bearer(token);
    server
        .post("/api/messages")
        .add_header(name, value)
        .json(&body)
        .await
}

async fn inbox(server: &TestServer, token: &str) -> Vec<Value> {
    let (name, value) = bearer(token);
    let response = server.get("/api/messages").add_header(name, value).await;
    response.assert_status(StatusCode::OK);
    response.json::<Vec<Value>>()
}

#[tokio::test]
async fn test_thread_is_visible_to_both_parties_newest_first() {
    let app = spawn_app().await;
    let (alice_id, alice) = register_and_login(&app.server, "alice").await;
    let (bob_id, bob) = register_and_login(&app.server, "bob").await;
    let (_, carol) = register_and_login(&app.server, "carol").await;
    let tent = create_listing(&app.server, &bob).await;

    let question = send(
        &app.server,
        &alice,
        json!({ "receiver_id": bob_id, "listing_id": tent, "content": "Is it free this weekend?" }),
    )
    .await;
    question.assert_status(StatusCode::CREATED);
    let question = question.json::<Value>();
    assert_eq!(question["sender_id"], alice_id);
    assert_eq!(question["sender"], "alice");
    assert_eq!(question["receiver"], "bob");

    let answer = send(
        &app.server,
        &bob,
        json!({ "receiver_id": alice_id, "listing_id": tent, "content": "Yes it is" }),
    )
    .await;
    answer.assert_status(StatusCode::CREATED);
    let answer = answer.json::<Value>();

    let expected = vec![answer["id"].clone(), question["id"].clone()];
    for token in [&alice, &bob] {
        let ids: Vec<Value> = inbox(&app.server, token)
            .await
            .iter()
            .map(|m| m["id"].clone())
            .collect();
        assert_eq!(ids, expected);
    }

    assert!(inbox(&app.server, &carol).await.is_empty());
}

#[tokio::test]
async fn test_unknown_receiver_or_listing_is_rejected() {
    let app = spawn_app().await;
    let (alice_id, alice) = register_and_login(&app.server, "alice").await;
    let tent = create_listing(&app.server, &alice).await;

    let unknown_receiver = send(
        &app.server,
        &alice,
        json!({ "receiver_id": 4242, "listing_id": tent, "content": "hello" }),
    )
    .await;
    unknown_receiver.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(unknown_receiver.json::<Value>()["error"], "validation_error");

    send(
        &app.server,
        &alice,
        json!({ "receiver_id": alice_id, "listing_id": 4242, "content": "hello" }),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    assert!(inbox(&app.server, &alice).await.is_empty());
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = spawn_app().await;
    let (alice_id, alice) = register_and_login(&app.server, "alice").await;
    let tent = create_listing(&app.server, &alice).await;

    for body in [
        json!({ "listing_id": tent, "content": "hi" }),
        json!({ "receiver_id": alice_id, "content": "hi" }),
        json!({ "receiver_id": alice_id, "listing_id": tent }),
        json!({ "receiver_id": alice_id, "listing_id": tent, "content": "   " }),
    ] {
        send(&app.server, &alice, body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_messaging_requires_session() {
    let app = spawn_app().await;

    app.server
        .post("/api/messages")
        .json(&json!({ "receiver_id": 1, "listing_id": 1, "content": "hi" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/messages")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
