use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{repository::row_store::StoreError, service::token_crud_service::CrudError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
    InvalidParameter,
    ValidationFailed,
    IllegalTransition,
    UnknownTable,
    UnknownStandard,
    DatabaseError,
    ServiceUnavailable,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
            Self::InvalidParameter => "invalid_parameter",
            Self::ValidationFailed => "validation_failed",
            Self::IllegalTransition => "illegal_transition",
            Self::UnknownTable => "unknown_table",
            Self::UnknownStandard => "unknown_standard",
            Self::DatabaseError => "database_error",
            Self::ServiceUnavailable => "service_unavailable",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
    /// 结构化错误详情，例如每条记录的字段校验错误
    pub details: Option<Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
            details: self.details.as_ref(),
        };
        let mut response = (self.status, Json(body)).into_response();
        // 请求 ID 中间件据此补写 trace_id
        response.extensions_mut().insert(self);
        response
    }
}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
            details: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Conflict, StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidParameter, StatusCode::BAD_REQUEST, msg)
    }

    pub fn validation_failed(msg: impl Into<String>, details: Value) -> Self {
        Self::new(
            AppErrorCode::ValidationFailed,
            StatusCode::UNPROCESSABLE_ENTITY,
            msg,
        )
        .with_details(details)
    }

    pub fn illegal_transition(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::IllegalTransition, StatusCode::CONFLICT, msg)
    }

    pub fn unknown_table(table: &str) -> Self {
        Self::new(
            AppErrorCode::UnknownTable,
            StatusCode::NOT_FOUND,
            format!("Unknown table: {}", table),
        )
    }

    pub fn unknown_standard(standard: &str) -> Self {
        Self::new(
            AppErrorCode::UnknownStandard,
            StatusCode::BAD_REQUEST,
            format!("Unknown token standard: {}", standard),
        )
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::DatabaseError,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::ServiceUnavailable,
            StatusCode::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    /// 设置追踪ID（即请求的 `x-request-id`）
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON serialization error: {}", err))
    }
}

// 从 SQLx 错误转换
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),
            sqlx::Error::Database(ref db_err) => {
                if let Some(code) = db_err.code() {
                    // PostgreSQL unique_violation
                    if code == "23505" {
                        return Self::conflict("Resource already exists");
                    }
                    // PostgreSQL foreign_key_violation
                    if code == "23503" {
                        return Self::bad_request("Foreign key constraint violation");
                    }
                    // PostgreSQL undefined_column
                    if code == "42703" {
                        return Self::bad_request(format!("Unknown column: {}", db_err));
                    }
                }
                Self::database_error(format!("Database error: {}", db_err))
            }
            _ => Self::database_error(format!("Database operation failed: {}", err)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => e.into(),
            StoreError::InvalidIdentifier(ident) => {
                Self::invalid_parameter(format!("Invalid identifier: {}", ident))
            }
            StoreError::NotFound { table, id } => {
                Self::not_found(format!("Row {} not found in {}", id, table))
            }
            e @ StoreError::Decode { .. } => Self::internal(e.to_string()),
            StoreError::Unavailable(msg) => Self::service_unavailable(msg),
        }
    }
}

impl From<CrudError> for AppError {
    fn from(err: CrudError) -> Self {
        match err {
            CrudError::Store(e) => e.into(),
            CrudError::Validation { table, errors } => Self::validation_failed(
                format!("Validation failed for {}", table),
                serde_json::json!(errors),
            ),
            CrudError::InvalidRecord(msg) => Self::bad_request(msg),
            CrudError::TokenNotFound(id) => Self::not_found(format!("Token {} not found", id)),
            e @ CrudError::IllegalTransition { .. } => Self::illegal_transition(e.to_string()),
        }
    }
}

// 从 UUID 错误转换
impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::invalid_parameter(format!("Invalid UUID: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}
