use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::{HeaderValue, Method},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Level;
use uuid::Uuid;

use crate::{app_state::AppState, error::AppError};

pub mod response;
pub mod token_api;

/// 组装全部路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.server.frontend_url.as_deref());

    Router::new()
        .route("/health", get(token_api::health))
        .route("/api/v1/tokens", post(token_api::create_token))
        .route(
            "/api/v1/tokens/:id",
            get(token_api::get_token).patch(token_api::update_token),
        )
        .route(
            "/api/v1/tokens/:id/status",
            post(token_api::transition_status),
        )
        .route(
            "/api/v1/tokens/:id/standard-tables",
            get(token_api::load_standard_tables),
        )
        .route(
            "/api/v1/tokens/:id/tables/:table",
            get(token_api::get_table_rows)
                .post(token_api::create_rows)
                .put(token_api::update_rows)
                .delete(token_api::delete_rows),
        )
        .route(
            "/api/v1/tables/:table/rows/:row_id",
            axum::routing::delete(token_api::delete_row),
        )
        .route(
            "/api/v1/tables/:table/validate",
            post(token_api::validate_rows),
        )
        .route(
            "/api/v1/standards/:standard/modules",
            get(token_api::list_standard_modules),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(set_request_id))
                .layer(from_fn(trace_log)),
        )
        .with_state(state)
}

/// 配置了前端地址时只放行该来源，否则放行任意来源（本地联调）
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    match frontend_url.and_then(|url| HeaderValue::from_str(url).ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

async fn set_request_id(mut req: Request, next: Next) -> Response {
    let req_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = HeaderValue::from_str(&req_id).unwrap_or(HeaderValue::from_static("gen-failed"));
    req.headers_mut().insert("x-request-id", header.clone());

    let mut resp = next.run(req).await;
    if let Some(err) = resp.extensions_mut().remove::<AppError>() {
        resp = err.with_trace_id(req_id).into_response();
    }
    resp.headers_mut().insert("x-request-id", header);
    resp
}

async fn trace_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let req_id = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, request_id=%req_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}
