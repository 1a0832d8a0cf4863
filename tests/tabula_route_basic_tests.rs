use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tabula::server::router::{TabulaState, tabula_router};
use tabula::service::DatabaseService;
use tabula::tenant::{StorageRoot, TenantStore};
use tempfile::TempDir;
use tower::ServiceExt;

const KEY: &str = "pwd";

async fn app() -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!("sqlite:{}", dir.path().join("catalog.sqlite").display());
    let catalog = tabula::catalog::spawn(&database_url)
        .await
        .expect("spawn catalog");
    let store = TenantStore::new(StorageRoot::new(dir.path().join("units")));
    let databases = DatabaseService::new(catalog, store, "db");
    let state = TabulaState::new(databases, Arc::from(KEY));
    (dir, tabula_router(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    tenant: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {KEY}"));
    if let Some(tenant) = tenant {
        builder = builder.header("x-tenant-id", tenant.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let resp = app.clone().oneshot(request).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn requests_need_the_key_and_a_tenant() {
    let (_dir, app) = app().await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/databases")
                .header("x-tenant-id", "1")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/databases")
                .header("x-tabula-key", "wrong")
                .header("x-tenant-id", "1")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/databases", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/databases", Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let (_dir, app) = app().await;
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_table_and_row_flow() {
    let (_dir, app) = app().await;

    let (status, db) = send(&app, "POST", "/databases", Some(1), Some(json!({"name": "shop"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let db_id = db["id"].as_i64().expect("database id");
    let base = format!("/databases/{db_id}");

    let (status, _) = send(
        &app,
        "POST",
        &format!("{base}/tables"),
        Some(1),
        Some(json!({"name": "t1", "columns": [{"name": "age", "type": "INTEGER"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &format!("{base}/tables"), Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["t1"]));

    let (status, body) = send(
        &app,
        "POST",
        &format!("{base}/tables/t1/rows"),
        Some(1),
        Some(json!({"age": 30, "bogus": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1}));

    let (status, body) = send(&app, "GET", &format!("{base}/tables/t1/rows"), Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "age": 30}]));

    let (status, body) = send(
        &app,
        "POST",
        &format!("{base}/tables/t1/rows"),
        Some(1),
        Some(json!({"bogus": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_VALID_COLUMNS");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("{base}/tables/t1/rows/1"),
        Some(1),
        Some(json!({"age": 31})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{base}/tables/t1/columns"),
        Some(1),
        Some(json!({"name": "note", "type": "whatever"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &format!("{base}/tables/t1/columns"), Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"name": "id", "type": "INTEGER", "is_primary_key": true},
            {"name": "age", "type": "INTEGER", "is_primary_key": false},
            {"name": "note", "type": "TEXT", "is_primary_key": false},
        ])
    );

    let (status, body) = send(&app, "GET", &format!("{base}/tables/t1/rows"), Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "age": 31, "note": null}]));

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("{base}/tables/t1/columns/id"),
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "COLUMN_DROP_UNSUPPORTED");

    let (status, _) = send(&app, "DELETE", &format!("{base}/tables/t1/rows/99"), Some(1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("{base}/tables/t1"), Some(1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("{base}/tables/t1/rows"), Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "TABLE_NOT_FOUND");

    let (status, _) = send(&app, "DELETE", &base, Some(1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &base, Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_identifiers_are_bad_requests() {
    let (_dir, app) = app().await;

    let (_, db) = send(&app, "POST", "/databases", Some(1), Some(json!({"name": "x"}))).await;
    let db_id = db["id"].as_i64().expect("database id");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/databases/{db_id}/tables"),
        Some(1),
        Some(json!({"name": "1abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn other_tenants_cannot_see_a_database() {
    let (_dir, app) = app().await;

    let (_, db) = send(&app, "POST", "/databases", Some(1), Some(json!({"name": "mine"}))).await;
    let db_id = db["id"].as_i64().expect("database id");

    let (status, body) = send(&app, "GET", &format!("/databases/{db_id}/tables"), Some(2), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "DATABASE_NOT_FOUND");

    let (status, body) = send(&app, "GET", "/databases", Some(2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn row_listing_honours_offset_and_limit() {
    let (_dir, app) = app().await;

    let (_, db) = send(&app, "POST", "/databases", Some(1), Some(json!({"name": "paged"}))).await;
    let base = format!("/databases/{}", db["id"].as_i64().expect("database id"));
    send(
        &app,
        "POST",
        &format!("{base}/tables"),
        Some(1),
        Some(json!({"name": "n", "columns": [{"name": "v", "type": "INTEGER"}]})),
    )
    .await;
    for v in 0..5 {
        send(&app, "POST", &format!("{base}/tables/n/rows"), Some(1), Some(json!({ "v": v }))).await;
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("{base}/tables/n/rows?offset=1&limit=2"),
        Some(1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 2, "v": 1}, {"id": 3, "v": 2}]));
}

#[tokio::test]
async fn non_string_column_types_are_coerced_to_text() {
    let (_dir, app) = app().await;

    let (_, db) = send(&app, "POST", "/databases", Some(1), Some(json!({"name": "loose"}))).await;
    let base = format!("/databases/{}", db["id"].as_i64().expect("database id"));
    let (status, _) = send(
        &app,
        "POST",
        &format!("{base}/tables"),
        Some(1),
        Some(json!({"name": "t", "columns": [{"name": "a", "type": null}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{base}/tables/t/columns"),
        Some(1),
        Some(json!({"name": "b", "type": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"name": "b", "type": "TEXT"}));

    let (_, body) = send(&app, "GET", &format!("{base}/tables/t/columns"), Some(1), None).await;
    let types: Vec<&str> = body
        .as_array()
        .expect("column list")
        .iter()
        .map(|c| c["type"].as_str().expect("type"))
        .collect();
    assert_eq!(types, vec!["INTEGER", "TEXT", "TEXT"]);
}
