//! 行存储抽象
//!
//! 编排层只通过这个 trait 访问持久化：按表名做 select / insert / update / delete，
//! 按主键或某个外键列过滤，可选只取部分列。行以 JSON 对象表示。
//!
//! 存储层不自动填充任何字段，`created_at` / `updated_at` 由调用方显式写入。

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::Record;

/// 远端存储调用失败
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("row {id} not found in {table}")]
    NotFound { table: String, id: Uuid },

    #[error("failed to decode row from {table}: {message}")]
    Decode { table: String, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository Trait
#[async_trait]
pub trait RowStore: Send + Sync {
    /// 按主键读取单行
    async fn select_by_id(
        &self,
        table: &str,
        id: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Option<Record>>;

    /// 按 `column = value` 读取多行
    async fn select_where(
        &self,
        table: &str,
        column: &str,
        value: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>>;

    /// 按 `column IN (values)` 读取多行
    async fn select_where_in(
        &self,
        table: &str,
        column: &str,
        values: &[Uuid],
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>>;

    /// 插入一行，返回存储层写入后的完整行（含生成的 id）
    async fn insert(&self, table: &str, record: Record) -> StoreResult<Record>;

    /// 按主键更新部分列，返回更新后的完整行
    async fn update(&self, table: &str, id: Uuid, patch: Record) -> StoreResult<Record>;

    /// 按主键删除，返回受影响行数
    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<u64>;

    /// 按 `column IN (values)` 删除，返回受影响行数
    async fn delete_where_in(&self, table: &str, column: &str, values: &[Uuid])
        -> StoreResult<u64>;
}

/// 读取记录的 `id` 列
///
/// 客户端新增的占位记录没有 id（或为 null / 空串），返回 `Ok(None)`；
/// 有值但不是合法 UUID 时报错。
pub fn record_id(table: &str, record: &Record) -> StoreResult<Option<Uuid>> {
    match record.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(s).map(Some).map_err(|e| StoreError::Decode {
            table: table.to_string(),
            message: format!("invalid id `{}`: {}", s, e),
        }),
        Some(other) => Err(StoreError::Decode {
            table: table.to_string(),
            message: format!("id must be a string, got {}", other),
        }),
    }
}

/// 只保留指定列
pub fn project(record: Record, columns: Option<&[&str]>) -> Record {
    match columns {
        None => record,
        Some(columns) => record
            .into_iter()
            .filter(|(key, _)| columns.contains(&key.as_str()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_record_id_placeholder() {
        assert_eq!(record_id("t", &record(json!({}))).unwrap(), None);
        assert_eq!(record_id("t", &record(json!({ "id": null }))).unwrap(), None);
        assert_eq!(record_id("t", &record(json!({ "id": "" }))).unwrap(), None);
    }

    #[test]
    fn test_record_id_parse() {
        let id = Uuid::new_v4();
        assert_eq!(
            record_id("t", &record(json!({ "id": id.to_string() }))).unwrap(),
            Some(id)
        );
        assert!(matches!(
            record_id("t", &record(json!({ "id": "nope" }))),
            Err(StoreError::Decode { .. })
        ));
        assert!(record_id("t", &record(json!({ "id": 7 }))).is_err());
    }

    #[test]
    fn test_project_columns() {
        let row = record(json!({ "id": "a", "name": "b", "token_id": "c" }));
        assert_eq!(project(row.clone(), None), row);
        assert_eq!(
            project(row, Some(&["id"])),
            record(json!({ "id": "a" }))
        );
    }
}
