//! PostgreSQL 行存储实现
//!
//! 表名和列名来自注册表和调用方记录，只能动态拼接，因此：
//! - 所有标识符必须匹配 `^[a-z_][a-z0-9_]*$` 并加双引号
//! - 值一律通过 JSONB 参数绑定，由 `jsonb_populate_record` 按表结构转换类型
//! - 读取统一返回 `to_jsonb(t.*)`，上层不关心列类型

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::row_store::{project, RowStore, StoreError, StoreResult};
use crate::{domain::Record, infrastructure::db::PgPool};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid")
});

/// 校验并加引号
fn quote_ident(name: &str) -> StoreResult<String> {
    if name.len() <= 63 && IDENTIFIER.is_match(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn quote_columns<'a>(columns: impl Iterator<Item = &'a str>) -> StoreResult<Vec<String>> {
    columns.map(quote_ident).collect()
}

fn into_record(table: &str, value: Value) -> StoreResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode {
            table: table.to_string(),
            message: format!("expected JSON object, got {}", other),
        }),
    }
}

/// 构造 `SELECT to_jsonb(t.*) FROM "table" AS t WHERE t."column" <op>`
fn select_sql(table: &str, column: &str, op: &str) -> StoreResult<String> {
    Ok(format!(
        "SELECT to_jsonb(t.*) FROM {} AS t WHERE t.{} {}",
        quote_ident(table)?,
        quote_ident(column)?,
        op
    ))
}

/// 构造 INSERT，只写入记录中出现的列
fn insert_sql(table: &str, record: &Record) -> StoreResult<String> {
    let table_ident = quote_ident(table)?;
    if record.is_empty() {
        return Ok(format!(
            "INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t.*)",
            table_ident
        ));
    }

    let columns = quote_columns(record.keys().map(String::as_str))?.join(", ");
    Ok(format!(
        "INSERT INTO {table} AS t ({columns}) \
         SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
         RETURNING to_jsonb(t.*)",
        table = table_ident,
        columns = columns,
    ))
}

/// 构造 UPDATE，只更新补丁中出现的列
fn update_sql(table: &str, patch: &Record) -> StoreResult<String> {
    let table_ident = quote_ident(table)?;
    let columns = quote_columns(patch.keys().map(String::as_str))?;

    let assignment = if columns.len() == 1 {
        format!(
            "{column} = (SELECT {column} FROM jsonb_populate_record(NULL::{table}, $1))",
            column = columns[0],
            table = table_ident,
        )
    } else {
        let list = columns.join(", ");
        format!(
            "({list}) = (SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1))",
            list = list,
            table = table_ident,
        )
    };

    Ok(format!(
        "UPDATE {} AS t SET {} WHERE t.\"id\" = $2 RETURNING to_jsonb(t.*)",
        table_ident, assignment
    ))
}

/// PostgreSQL 实现
pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode_rows(
        table: &str,
        values: Vec<Value>,
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>> {
        values
            .into_iter()
            .map(|value| into_record(table, value).map(|row| project(row, columns)))
            .collect()
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn select_by_id(
        &self,
        table: &str,
        id: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Option<Record>> {
        let sql = select_sql(table, "id", "= $1")?;
        let value = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        value
            .map(|v| into_record(table, v).map(|row| project(row, columns)))
            .transpose()
    }

    async fn select_where(
        &self,
        table: &str,
        column: &str,
        value: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>> {
        let sql = select_sql(table, column, "= $1")?;
        let values = sqlx::query_scalar::<_, Value>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        Self::decode_rows(table, values, columns)
    }

    async fn select_where_in(
        &self,
        table: &str,
        column: &str,
        values: &[Uuid],
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let sql = select_sql(table, column, "= ANY($1)")?;
        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .bind(values)
            .fetch_all(&self.pool)
            .await?;

        Self::decode_rows(table, rows, columns)
    }

    async fn insert(&self, table: &str, record: Record) -> StoreResult<Record> {
        let sql = insert_sql(table, &record)?;
        let value = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(record))
            .fetch_one(&self.pool)
            .await?;

        into_record(table, value)
    }

    async fn update(&self, table: &str, id: Uuid, patch: Record) -> StoreResult<Record> {
        if patch.is_empty() {
            return self
                .select_by_id(table, id, None)
                .await?
                .ok_or_else(|| StoreError::NotFound {
                    table: table.to_string(),
                    id,
                });
        }

        let sql = update_sql(table, &patch)?;
        let value = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(patch))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            Some(value) => into_record(table, value),
            None => Err(StoreError::NotFound {
                table: table.to_string(),
                id,
            }),
        }
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE \"id\" = $1", quote_ident(table)?);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_where_in(
        &self,
        table: &str,
        column: &str,
        values: &[Uuid],
    ) -> StoreResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = ANY($1)",
            quote_ident(table)?,
            quote_ident(column)?
        );
        let result = sqlx::query(&sql).bind(values).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
