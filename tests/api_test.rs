// End-to-end tests for the HTTP API, driven through the router without a
// listening socket

#![cfg(feature = "server")]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use catering::{server::router, setup_database, SharedDb};

fn test_app() -> (Router, SharedDb) {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    let db: SharedDb = Arc::new(Mutex::new(conn));
    (router(Arc::clone(&db)), db)
}

/// Send one request and return the status with the parsed JSON body
/// (Value::Null when the body is empty)
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_client(app: &Router, first_name: &str, last_name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/clients",
        Some(json!({ "first_name": first_name, "last_name": last_name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_cook(app: &Router, first_name: &str, last_name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/cooks",
        Some(json!({ "first_name": first_name, "last_name": last_name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_end_to_end_soup() {
    let (app, _) = test_app();
    let client_id = create_client(&app, "Ana", "Lee").await;
    let cook_id = create_cook(&app, "Sam", "Ortiz").await;

    let (status, dish) = send(
        &app,
        Method::POST,
        &format!("/api/dishes/{client_id}/{cook_id}"),
        Some(json!({ "label": "Soup", "price": 5.0, "calories": 300, "category": "STARTER" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dish["client_id"], client_id);
    assert_eq!(dish["cook_ids"], json!([cook_id]));

    let (status, total) = send(&app, Method::GET, &format!("/api/clients/{client_id}/total"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total.as_f64(), Some(5.0));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/clients/{client_id}/classification"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (_, client) = send(&app, Method::GET, &format!("/api/clients/{client_id}"), None).await;
    assert_eq!(client["classification"], "LOW");

    let (status, dishes) = send(&app, Method::GET, "/api/client-dishes/Ana/Lee", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dishes.as_array().unwrap().len(), 1);
    assert_eq!(dishes[0]["label"], "Soup");
}

#[tokio::test]
async fn test_source_category_names_accepted() {
    let (app, _) = test_app();
    let client_id = create_client(&app, "Ana", "Lee").await;
    let cook_id = create_cook(&app, "Sam", "Ortiz").await;

    let (status, dish) = send(
        &app,
        Method::POST,
        &format!("/api/dishes/{client_id}/{cook_id}"),
        Some(json!({ "label": "Tajine", "price": 14.0, "calories": 2000, "category": "PRINCIPAL" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dish["category"], "MAIN");

    send(&app, Method::PUT, &format!("/api/clients/{client_id}/classification"), None).await;
    let (_, client) = send(&app, Method::GET, &format!("/api/clients/{client_id}"), None).await;
    assert_eq!(client["classification"], "IDEAL");
}

#[tokio::test]
async fn test_missing_records_are_404() {
    let (app, _) = test_app();
    let cook_id = create_cook(&app, "Sam", "Ortiz").await;

    let (status, body) = send(&app, Method::GET, "/api/clients/41/total", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "client 41 not found");

    let (status, _) = send(&app, Method::PUT, "/api/clients/41/classification", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/dishes/41/{cook_id}"),
        Some(json!({ "label": "Soup", "price": 5.0, "calories": 300, "category": "STARTER" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/client-dishes/No/Body", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "client not found: No Body");

    let (status, _) = send(&app, Method::GET, "/api/cooks/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_price_is_400() {
    let (app, db) = test_app();
    let client_id = create_client(&app, "Ana", "Lee").await;
    let cook_id = create_cook(&app, "Sam", "Ortiz").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/dishes/{client_id}/{cook_id}"),
        Some(json!({ "label": "Soup", "price": -5.0, "calories": 300, "category": "STARTER" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let conn = db.lock().unwrap();
    let dishes: i64 = conn
        .query_row("SELECT COUNT(*) FROM dishes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(dishes, 0);
}

#[tokio::test]
async fn test_out_of_range_amounts_are_400() {
    let (app, _) = test_app();
    let client_id = create_client(&app, "Ana", "Lee").await;
    let cook_id = create_cook(&app, "Sam", "Ortiz").await;
    let uri = format!("/api/dishes/{client_id}/{cook_id}");

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "label": "Gold", "price": 1e300, "calories": 300, "category": "MAIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "label": "Plate", "price": 1.0, "calories": 1999.996, "category": "MAIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The bill stays computable
    let (status, total) = send(&app, Method::GET, &format!("/api/clients/{client_id}/total"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(total.as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_client_without_dishes_lists_empty() {
    let (app, _) = test_app();
    create_client(&app, "Ana", "Lee").await;

    let (status, dishes) = send(&app, Method::GET, "/api/client-dishes/Ana/Lee", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dishes, json!([]));
}

#[tokio::test]
async fn test_attach_cook_route() {
    let (app, db) = test_app();
    let client_id = create_client(&app, "Ana", "Lee").await;
    let sam = create_cook(&app, "Sam", "Ortiz").await;
    let kim = create_cook(&app, "Kim", "Park").await;

    let (_, dish) = send(
        &app,
        Method::POST,
        &format!("/api/dishes/{client_id}/{sam}"),
        Some(json!({ "label": "Stew", "price": 9.5, "calories": 700, "category": "MAIN" })),
    )
    .await;
    let dish_id = dish["id"].as_i64().unwrap();

    let (status, dish) = send(&app, Method::POST, &format!("/api/dish-cooks/{dish_id}/{kim}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dish["cook_ids"], json!([sam, kim]));

    // A second dish for Sam; the shared Stew is MAIN so Sam is reportable.
    // Kim only has the Stew.
    send(
        &app,
        Method::POST,
        &format!("/api/dishes/{client_id}/{sam}"),
        Some(json!({ "label": "Salad", "price": 4.0, "calories": 150, "category": "STARTER" })),
    )
    .await;
    let reported = catering::run_scan(&db);
    assert_eq!(reported.iter().map(|c| c.id).collect::<Vec<_>>(), vec![sam]);
}
