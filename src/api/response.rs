//! 成功响应统一为 `{ code: 0, message: "success", data }`
//!
//! 失败响应由 [`AppError`] 渲染为 `{ code, message, trace_id, details? }`，
//! 其中 `trace_id` 由请求 ID 中间件补写。

use axum::Json;
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: &'static str,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// 包装处理器返回的数据
pub fn success_response<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        code: 0,
        message: "success",
        data,
    }))
}
