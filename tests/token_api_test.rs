//! HTTP 层集成测试（内存存储，不需要数据库）

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use common::{app_state, InMemoryRowStore};
use serde_json::{json, Value};
use tokencore::api::create_router;
use tower::ServiceExt;
use uuid::Uuid;

fn router(store: &std::sync::Arc<InMemoryRowStore>, strict: bool) -> Router {
    create_router(app_state(store, strict))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_without_database() {
    let store = InMemoryRowStore::new();
    let (status, body) = send(router(&store, false), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], json!(0));
    assert_eq!(body["data"]["status"], json!("ok"));
    assert_eq!(body["data"]["database"], json!("disabled"));
}

#[tokio::test]
async fn test_create_and_get_token() {
    let store = InMemoryRowStore::new();
    let app = router(&store, false);

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/v1/tokens",
        Some(json!({ "name": "Alpha", "symbol": "ALP", "standard": "erc-721" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["standard"], json!("ERC-721"));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(app, Method::GET, &format!("/api/v1/tokens/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("DRAFT"));
}

#[tokio::test]
async fn test_get_missing_token_is_404() {
    let store = InMemoryRowStore::new();
    let (status, body) = send(
        router(&store, false),
        Method::GET,
        &format!("/api/v1/tokens/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("not_found"));
}

#[tokio::test]
async fn test_invalid_id_and_unknown_table() {
    let store = InMemoryRowStore::new();
    let app = router(&store, false);

    let (status, body) = send(app.clone(), Method::GET, "/api/v1/tokens/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_parameter"));

    let (status, body) = send(
        app,
        Method::GET,
        &format!("/api/v1/tokens/{}/tables/users", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("unknown_table"));
}

#[tokio::test]
async fn test_strict_mode_returns_field_errors() {
    let store = InMemoryRowStore::new();
    let (status, body) = send(
        router(&store, true),
        Method::POST,
        "/api/v1/tokens",
        Some(json!({ "symbol": "ALP", "standard": "ERC-20" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], json!("validation_failed"));
    assert_eq!(body["details"], json!([{ "name": ["name is required"] }]));
    assert!(store.rows("tokens").is_empty());
}

#[tokio::test]
async fn test_status_transition_endpoint() {
    let store = InMemoryRowStore::new();
    let token_id = store.seed(
        "tokens",
        json!({ "name": "A", "symbol": "A", "standard": "ERC-20", "status": "DRAFT" }),
    );
    let app = router(&store, false);
    let uri = format!("/api/v1/tokens/{}/status", token_id);

    let (status, body) = send(
        app.clone(),
        Method::POST,
        &uri,
        Some(json!({ "status": "under_review" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("UNDER_REVIEW"));

    let (status, body) = send(app.clone(), Method::POST, &uri, Some(json!({ "status": "MINTED" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("illegal_transition"));

    let (status, _) = send(app, Method::POST, &uri, Some(json!({ "status": "LAUNCHED" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_table_rows_endpoints() {
    let store = InMemoryRowStore::new();
    let token_id = store.seed(
        "tokens",
        json!({ "name": "A", "symbol": "A", "standard": "ERC-721" }),
    );
    let app = router(&store, false);
    let uri = format!("/api/v1/tokens/{}/tables/token_erc721_attributes", token_id);

    let (status, body) = send(
        app.clone(),
        Method::POST,
        &uri,
        Some(json!([{ "trait_type": "color" }, { "trait_type": "size" }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(app.clone(), Method::GET, &uri, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = send(app.clone(), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], json!(2));

    let (_, body) = send(app, Method::GET, &uri, None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_standard_tables_endpoint_uses_token_standard() {
    let store = InMemoryRowStore::new();
    let token_id = store.seed(
        "tokens",
        json!({ "name": "A", "symbol": "A", "standard": "ERC-20" }),
    );

    let (status, body) = send(
        router(&store, false),
        Method::GET,
        &format!("/api/v1/tokens/{}/standard-tables", token_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tokens"]["symbol"], json!("A"));
    assert_eq!(body["data"]["token_erc20_properties"], json!([]));
}

#[tokio::test]
async fn test_validate_endpoint() {
    let store = InMemoryRowStore::new();
    let (status, body) = send(
        router(&store, false),
        Method::POST,
        "/api/v1/tables/tokens/validate",
        Some(json!([{ "name": "A", "symbol": "TOOLONGSYMBOL", "standard": "ERC-20" }])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], json!(false));
    assert_eq!(
        body["data"]["errors"][0]["symbol"],
        json!(["symbol must be at most 10 characters"])
    );
}

#[tokio::test]
async fn test_standard_modules_endpoint() {
    let store = InMemoryRowStore::new();
    let app = router(&store, false);

    let (status, body) = send(app.clone(), Method::GET, "/api/v1/standards/erc4626/modules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["standard"], json!("ERC-4626"));
    assert_eq!(body["data"]["tables"][0], json!("token_erc4626_properties"));
    assert_eq!(body["data"]["modules"][0]["name"], json!("compliance"));

    let (status, body) = send(app, Method::GET, "/api/v1/standards/erc777/modules", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("unknown_standard"));
}

#[tokio::test]
async fn test_request_id_echoed() {
    let store = InMemoryRowStore::new();
    let response = router(&store, false)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn test_error_body_carries_request_id() {
    let store = InMemoryRowStore::new();
    let response = router(&store, false)
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/tokens/{}", Uuid::new_v4()))
                .header("x-request-id", "req-404")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "req-404");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["trace_id"], json!("req-404"));
}

#[tokio::test]
async fn test_delete_endpoints_reject_root_table() {
    let store = InMemoryRowStore::new();
    let token_id = store.seed(
        "tokens",
        json!({ "name": "A", "symbol": "A", "standard": "ERC-20", "status": "DRAFT" }),
    );
    let app = router(&store, false);

    let (status, body) = send(
        app.clone(),
        Method::DELETE,
        &format!("/api/v1/tables/tokens/rows/{}", token_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("bad_request"));

    let (status, _) = send(
        app,
        Method::DELETE,
        &format!("/api/v1/tokens/{}/tables/tokens", token_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.rows("tokens").len(), 1);
}
