//! 代币 CRUD API
//!
//! 路径中的 id 以字符串接收再解析，非法 UUID 返回 invalid_parameter。
//! 表名必须是注册表中已知的表；删除接口不接受根表 `tokens`。

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    api::response::{success_response, ApiResult},
    app_state::AppState,
    domain::{
        module_registry::{self, ModuleSpec},
        table_registry, Record, TokenStandard, TokenStatus, ValidationErrors,
    },
    error::AppError,
    infrastructure::db,
    service::{partition_resolver::TableData, token_crud_service::StandardTables},
};

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(Uuid::parse_str(raw)?)
}

fn known_table(table: &str) -> Result<&str, AppError> {
    if table_registry::is_known_table(table) {
        Ok(table)
    } else {
        Err(AppError::unknown_table(table))
    }
}

/// 可删除的子表；根表只能经状态流转退役
fn deletable_table(table: &str) -> Result<&str, AppError> {
    let table = known_table(table)?;
    if table == table_registry::TOKENS_TABLE {
        return Err(AppError::bad_request(
            "tokens cannot be deleted, use the status endpoint",
        ));
    }
    Ok(table)
}

/// POST /api/v1/tokens
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(record): Json<Record>,
) -> ApiResult<Record> {
    let created = state.token_service.create_token(record).await?;
    success_response(created)
}

/// GET /api/v1/tokens/:id
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    let token_id = parse_id(&id)?;
    let token = state
        .token_service
        .get_token(token_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Token {} not found", token_id)))?;
    success_response(token)
}

/// PATCH /api/v1/tokens/:id
pub async fn update_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<Record>,
) -> ApiResult<Record> {
    let token_id = parse_id(&id)?;
    let updated = state.token_service.update_token(token_id, patch).await?;
    success_response(updated)
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /api/v1/tokens/:id/status
pub async fn transition_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Record> {
    let token_id = parse_id(&id)?;
    let target = TokenStatus::parse(&req.status)
        .ok_or_else(|| AppError::invalid_parameter(format!("Unknown status: {}", req.status)))?;

    info!(token_id = %token_id, target = %target, "status transition requested");
    let updated = state
        .token_service
        .transition_status(token_id, target)
        .await?;
    success_response(updated)
}

#[derive(Debug, Deserialize)]
pub struct StandardTablesQuery {
    /// 未指定时从代币根记录读取
    pub standard: Option<String>,
}

/// GET /api/v1/tokens/:id/standard-tables
pub async fn load_standard_tables(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<StandardTablesQuery>,
) -> ApiResult<StandardTables> {
    let token_id = parse_id(&id)?;
    let tables = match query.standard {
        Some(standard) => {
            state
                .token_service
                .load_standard_tables(token_id, &standard)
                .await
        }
        None => state.token_service.load_token_bundle(token_id).await?,
    };
    success_response(tables)
}

/// GET /api/v1/tokens/:id/tables/:table
pub async fn get_table_rows(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(String, String)>,
) -> ApiResult<TableData> {
    let token_id = parse_id(&id)?;
    let table = known_table(&table)?;
    let data = state.token_service.get_table_rows(table, token_id).await?;
    success_response(data)
}

/// POST /api/v1/tokens/:id/tables/:table
pub async fn create_rows(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(String, String)>,
    Json(rows): Json<Vec<Record>>,
) -> ApiResult<Vec<Record>> {
    let token_id = parse_id(&id)?;
    let table = known_table(&table)?;
    let created = state
        .token_service
        .create_rows(table, token_id, rows)
        .await?;
    success_response(created)
}

/// PUT /api/v1/tokens/:id/tables/:table
pub async fn update_rows(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(String, String)>,
    Json(rows): Json<Vec<Record>>,
) -> ApiResult<Vec<Record>> {
    let token_id = parse_id(&id)?;
    let table = known_table(&table)?;
    let saved = state
        .token_service
        .update_rows(table, token_id, rows)
        .await?;
    success_response(saved)
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// DELETE /api/v1/tokens/:id/tables/:table
pub async fn delete_rows(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(String, String)>,
) -> ApiResult<DeleteResponse> {
    let token_id = parse_id(&id)?;
    let table = deletable_table(&table)?;
    let deleted = state.token_service.delete_rows(table, token_id).await?;
    success_response(DeleteResponse { deleted })
}

/// DELETE /api/v1/tables/:table/rows/:row_id
pub async fn delete_row(
    State(state): State<Arc<AppState>>,
    Path((table, row_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let table = deletable_table(&table)?;
    let row_id = parse_id(&row_id)?;
    state.token_service.delete_row(table, row_id).await?;
    success_response(())
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<ValidationErrors>,
}

/// POST /api/v1/tables/:table/validate
pub async fn validate_rows(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Json(rows): Json<Vec<Record>>,
) -> ApiResult<ValidationResponse> {
    let table = known_table(&table)?;
    let errors = state.token_service.validate_rows(table, &rows);
    let valid = errors.iter().all(ValidationErrors::is_empty);
    success_response(ValidationResponse { valid, errors })
}

#[derive(Debug, Serialize)]
pub struct StandardModulesResponse {
    pub standard: &'static str,
    pub tables: &'static [&'static str],
    pub modules: &'static [ModuleSpec],
}

/// GET /api/v1/standards/:standard/modules
pub async fn list_standard_modules(
    Path(standard): Path<String>,
) -> ApiResult<StandardModulesResponse> {
    let parsed =
        TokenStandard::parse(&standard).ok_or_else(|| AppError::unknown_standard(&standard))?;
    success_response(StandardModulesResponse {
        standard: parsed.as_db_str(),
        tables: table_registry::standard_tables(parsed),
        modules: module_registry::modules_for_standard(parsed),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let database = match &state.pool {
        None => "disabled",
        Some(pool) => match db::health_check(pool).await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "database health check failed");
                "unavailable"
            }
        },
    };

    let status = if database == "unavailable" {
        "degraded"
    } else {
        "ok"
    };
    success_response(HealthResponse { status, database })
}
