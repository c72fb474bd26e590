//! HTTP adapter tests
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot`:
//! basic-auth extraction, per-operation authorization, and the mapping of
//! store errors onto status codes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tempfile::TempDir;
use tower::ServiceExt;

use rowdb::auth::hash_password;
use rowdb::http_server::{AppState, HttpConfig, HttpServer};
use rowdb::schema::{sort_schema_for, FieldSchema, FieldType, ID_FIELD, VERSION_FIELD};
use rowdb::storage::RecordLog;
use rowdb::store::Store;

// =============================================================================
// Test Utilities
// =============================================================================

fn fields(resource: &str, extra: &[(&str, FieldType)]) -> Vec<FieldSchema> {
    let mut fs = vec![
        FieldSchema::new(resource, ID_FIELD, FieldType::Text),
        FieldSchema::new(resource, VERSION_FIELD, FieldType::Number),
    ];
    for (name, ty) in extra {
        fs.push(FieldSchema::new(resource, *name, *ty));
    }
    fs
}

fn seed(log: &RecordLog, rows: &[&[&str]]) {
    for row in rows {
        let mut rec: Vec<String> = row.iter().map(|s| s.to_string()).collect();
        rec.insert(1, String::new());
        log.create(rec).unwrap();
    }
}

fn test_router(dir: &TempDir) -> Router {
    let users_fields = fields(
        "_users",
        &[
            ("salt", FieldType::Text),
            ("password", FieldType::Text),
            ("roles", FieldType::List),
        ],
    );
    let perms_fields = fields(
        "_permissions",
        &[
            ("resource", FieldType::Text),
            ("action", FieldType::Text),
            ("role", FieldType::Text),
            ("field", FieldType::Text),
        ],
    );
    let mut books_fields = fields(
        "books",
        &[
            ("title", FieldType::Text),
            ("owner", FieldType::Text),
            ("coowners", FieldType::List),
        ],
    );
    books_fields.insert(
        4,
        FieldSchema::new("books", "publication_year", FieldType::Number).with_range(0.0, 2500.0),
    );

    let users_log =
        RecordLog::open(&dir.path().join("_users.csv"), sort_schema_for(&users_fields)).unwrap();
    let perms_log = RecordLog::open(
        &dir.path().join("_permissions.csv"),
        sort_schema_for(&perms_fields),
    )
    .unwrap();
    let books_log =
        RecordLog::open(&dir.path().join("books.csv"), sort_schema_for(&books_fields)).unwrap();

    for (name, password, roles) in [
        ("alice", "alicepass", "editor"),
        ("bob", "bobpass", ""),
        ("root", "admin123", "admin"),
    ] {
        let salt = format!("{name}-salt");
        let digest = hash_password(password, &salt);
        seed(&users_log, &[&[name, &salt, &digest, roles]]);
    }

    seed(
        &perms_log,
        &[
            &["p1", "books", "read", "", ""],
            &["p2", "books", "create", "editor", ""],
            &["p3", "books", "update", "", "owner"],
            &["p4", "books", "delete", "admin", ""],
        ],
    );

    // columns: _id, _v, title, owner, publication_year, coowners
    seed(
        &books_log,
        &[
            &["book123", "Some Book", "bob", "1999", "alice"],
            &["book456", "Older Book", "bob", "1950", ""],
        ],
    );

    let mut schemas = HashMap::new();
    schemas.insert("_users".to_string(), users_fields);
    schemas.insert("_permissions".to_string(), perms_fields);
    schemas.insert("books".to_string(), books_fields);

    let mut logs = HashMap::new();
    logs.insert("_users".to_string(), users_log);
    logs.insert("_permissions".to_string(), perms_log);
    logs.insert("books".to_string(), books_log);

    let store = Arc::new(Store::new(schemas, logs));
    let state = Arc::new(AppState { store });

    HttpServer::new(HttpConfig::default(), state).router()
}

fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn get_as(path: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, path: &str, auth: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_health_probe() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_list_of_public_resource() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router.oneshot(get("/api/books")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_sorted_by_query_parameter() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(get("/api/books?sort_by=publication_year"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    let years: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["publication_year"].as_f64().unwrap())
        .collect();
    assert_eq!(years, vec![1950.0, 1999.0]);
}

#[tokio::test]
async fn test_read_one_and_unknown_id() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .clone()
        .oneshot(get("/api/books/book123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["title"], "Some Book");
    assert_eq!(body["_v"], 1.0);

    let resp = router.oneshot(get("/api/books/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Authentication boundary
// =============================================================================

#[tokio::test]
async fn test_bad_credentials_are_rejected_outright() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(get_as("/api/books", &basic("alice", "wrongpass")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_anonymous_restricted_action_is_unauthorized() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/books/book123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_create_update_delete_flow() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    // alice (editor) creates
    let resp = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/books",
            &basic("alice", "alicepass"),
            r#"{"title": "New Book", "publication_year": 2024, "owner": "bob"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    let id = body["_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 12);

    // bob owns it and may update; the boundary validates the whole payload,
    // so unspecified fields arrive as zeros
    let resp = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/books/{id}"),
            &basic("bob", "bobpass"),
            r#"{"title": "New Book (2nd ed)", "publication_year": 2024, "owner": "bob"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .clone()
        .oneshot(get(&format!("/api/books/{id}")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["title"], "New Book (2nd ed)");
    assert_eq!(body["publication_year"], 2024.0);
    assert_eq!(body["_v"], 2.0);

    // only admin deletes
    let resp = router
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/books/{id}"),
            &basic("bob", "bobpass"),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = router
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/books/{id}"),
            &basic("root", "admin123"),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = router
        .oneshot(get(&format!("/api/books/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_without_role_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(json_request(
            "POST",
            "/api/books",
            &basic("bob", "bobpass"),
            r#"{"title": "Bob's Book"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_schema_violation_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(json_request(
            "POST",
            "/api/books",
            &basic("alice", "alicepass"),
            r#"{"title": "X", "publication_year": 3000}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("publication_year"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir);

    let resp = router
        .oneshot(json_request(
            "POST",
            "/api/books",
            &basic("alice", "alicepass"),
            "{not json",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
