use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{JwtVerifier, ServerState};

const SECRET: &str = "test-secret";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(ServerState {
        engine: Arc::new(engine),
        jwt: Arc::new(JwtVerifier::new(SECRET)),
    })
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, name: &str) -> (i64, String) {
    let (status, body) = call(app, "POST", "/members", None, Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["member"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn dinner_group(app: &Router, token: &str, ids: &[i64]) -> i64 {
    let (status, body) = call(
        app,
        "POST",
        "/groups",
        Some(token),
        Some(json!({ "name": "Dinner", "member_ids": ids })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

fn balance_of(balances: &Value, member_id: i64) -> i64 {
    balances
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["member_id"].as_i64() == Some(member_id))
        .and_then(|b| b["balance_minor"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn registration_returns_usable_token() {
    let app = app().await;
    let (id, token) = register(&app, "Alice").await;

    let (status, body) = call(&app, "GET", &format!("/members/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["registered"], true);
}

#[tokio::test]
async fn protected_routes_require_bearer() {
    let app = app().await;
    let (id, _) = register(&app, "Alice").await;

    let (status, _) = call(&app, "GET", &format!("/members/{id}"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/groups", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = JwtVerifier::new("other-secret").issue(id).unwrap();
    let (status, _) = call(&app, "GET", "/groups", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dinner_flow_over_http() {
    let app = app().await;
    let (a, token) = register(&app, "Alice").await;
    let (b, _) = register(&app, "Bob").await;
    let (c, _) = register(&app, "Carol").await;
    let group_id = dinner_group(&app, &token, &[a, b, c]).await;

    let (status, expense) = call(
        &app,
        "POST",
        "/expenses",
        Some(&token),
        Some(json!({
            "description": "Dinner",
            "amount_minor": 30000,
            "group_id": group_id,
            "payers": [{ "member_id": a, "amount_minor": 30000 }],
            "splits": [
                { "member_id": a, "amount_minor": 10000 },
                { "member_id": b, "amount_minor": 10000 },
                { "member_id": c, "amount_minor": 10000 },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(expense["amount_minor"], 30000);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/expenses/balance?group_id={group_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance_of(&body["balances"], a), 20000);
    assert_eq!(balance_of(&body["balances"], b), -10000);
    assert_eq!(balance_of(&body["balances"], c), -10000);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/expenses/settlements?group_id={group_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["transactions"],
        json!([
            { "from": b, "to": a, "amount_minor": 10000 },
            { "from": c, "to": a, "amount_minor": 10000 },
        ])
    );

    let (status, body) = call(
        &app,
        "GET",
        &format!("/groups/{group_id}/debts"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["my_position"]["total_to_receive_minor"], 20000);
    assert_eq!(body["my_position"]["total_owed_minor"], 0);
    assert_eq!(body["transactions"][0]["to_name"], "Alice");
}

#[tokio::test]
async fn rejected_update_leaves_expense_untouched() {
    let app = app().await;
    let (a, token) = register(&app, "Alice").await;
    let (b, _) = register(&app, "Bob").await;
    let group_id = dinner_group(&app, &token, &[a, b]).await;

    let write = |split_b: i64| {
        json!({
            "description": "Taxi",
            "amount_minor": 10000,
            "group_id": group_id,
            "payers": [{ "member_id": a, "amount_minor": 10000 }],
            "splits": [
                { "member_id": a, "amount_minor": 5000 },
                { "member_id": b, "amount_minor": split_b },
            ],
        })
    };

    let (status, expense) = call(&app, "POST", "/expenses", Some(&token), Some(write(5000))).await;
    assert_eq!(status, StatusCode::CREATED);
    let expense_id = expense["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/expenses/{expense_id}"),
        Some(&token),
        Some(write(3000)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("split"));

    let (_, body) = call(
        &app,
        "GET",
        &format!("/expenses?group_id={group_id}"),
        Some(&token),
        None,
    )
    .await;
    let split_b = body["expenses"][0]["splits"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["member_id"].as_i64() == Some(b))
        .unwrap();
    assert_eq!(split_b["amount_minor"], 5000);

    let (_, body) = call(
        &app,
        "GET",
        &format!("/expenses/{expense_id}/history"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["action"], "created");
}

#[tokio::test]
async fn delete_is_logged_and_missing_ids_are_404() {
    let app = app().await;
    let (a, token) = register(&app, "Alice").await;
    let (b, _) = register(&app, "Bob").await;
    let group_id = dinner_group(&app, &token, &[a, b]).await;

    let (_, expense) = call(
        &app,
        "POST",
        "/expenses",
        Some(&token),
        Some(json!({
            "description": "Snacks",
            "amount_minor": 800,
            "group_id": group_id,
            "payers": [{ "member_id": b, "amount_minor": 800 }],
            "splits": [
                { "member_id": a, "amount_minor": 400 },
                { "member_id": b, "amount_minor": 400 },
            ],
        })),
    )
    .await;
    let expense_id = expense["id"].as_i64().unwrap();

    let (status, _) = call(&app, "DELETE", &format!("/expenses/{expense_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "DELETE", &format!("/expenses/{expense_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "GET", "/expenses/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["deleted", "created"]);
    assert_eq!(body["entries"][0]["member_name"], "Alice");
    assert!(body["entries"][0]["new_data"].is_null());

    let (status, _) = call(
        &app,
        "GET",
        "/expenses/balance?group_id=999",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_update_adds_unregistered_members() {
    let app = app().await;
    let (a, token) = register(&app, "Alice").await;
    let group_id = dinner_group(&app, &token, &[a]).await;

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/groups/{group_id}"),
        Some(&token),
        Some(json!({
            "name": "Ski trip",
            "member_ids": [a],
            "extra_members": [{ "name": "Dana", "email": "dana@example.com" }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ski trip");
    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    let dana = members.iter().find(|m| m["name"] == "Dana").unwrap();
    assert_eq!(dana["registered"], false);

    let (_, body) = call(&app, "GET", "/groups", Some(&token), None).await;
    assert_eq!(body["groups"][0]["name"], "Ski trip");
}
