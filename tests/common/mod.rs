//! 测试辅助模块
//! 提供内存行存储、查询日志和故障注入

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokencore::{
    app_state::AppState,
    config::{Config, CrudConfig, DatabaseConfig, LoggingConfig, ServerConfig},
    domain::Record,
    repository::row_store::{project, RowStore, StoreError, StoreResult},
    service::token_crud_service::TokenCrudService,
};
use uuid::Uuid;

/// 一次存储调用的记录
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLog {
    pub op: &'static str,
    pub table: String,
    pub column: Option<String>,
    pub values: Vec<Uuid>,
}

/// 内存行存储
///
/// 行以 JSON 对象保存，`id` 为字符串形式的 UUID。
#[derive(Default)]
pub struct InMemoryRowStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    log: Mutex<Vec<QueryLog>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryRowStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 直接写入一行，不记入查询日志；没有 id 时自动生成
    pub fn seed(&self, table: &str, row: Value) -> Uuid {
        let mut row = row.as_object().cloned().expect("seed row must be an object");
        let id = match row.get("id").and_then(Value::as_str) {
            Some(id) => Uuid::parse_str(id).expect("seed id must be a uuid"),
            None => {
                let id = Uuid::new_v4();
                row.insert("id".into(), json!(id.to_string()));
                id
            }
        };
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
        id
    }

    /// 之后对该表的任何调用都返回错误
    pub fn fail_table(&self, table: &str) {
        self.failing.lock().unwrap().insert(table.to_string());
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: Uuid) -> Option<Record> {
        self.rows(table)
            .into_iter()
            .find(|row| matches_id(row, "id", id))
    }

    pub fn log(&self) -> Vec<QueryLog> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record(&self, op: &'static str, table: &str, column: Option<&str>, values: &[Uuid]) {
        self.log.lock().unwrap().push(QueryLog {
            op,
            table: table.to_string(),
            column: column.map(str::to_string),
            values: values.to_vec(),
        });
    }

    fn check(&self, table: &str) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(table) {
            return Err(StoreError::Unavailable(format!("{} is unavailable", table)));
        }
        Ok(())
    }
}

fn matches_id(row: &Record, column: &str, id: Uuid) -> bool {
    row.get(column)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        == Some(id)
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn select_by_id(
        &self,
        table: &str,
        id: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Option<Record>> {
        self.record("select_by_id", table, Some("id"), &[id]);
        self.check(table)?;
        Ok(self.row(table, id).map(|row| project(row, columns)))
    }

    async fn select_where(
        &self,
        table: &str,
        column: &str,
        value: Uuid,
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>> {
        self.record("select_where", table, Some(column), &[value]);
        self.check(table)?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| matches_id(row, column, value))
            .map(|row| project(row, columns))
            .collect())
    }

    async fn select_where_in(
        &self,
        table: &str,
        column: &str,
        values: &[Uuid],
        columns: Option<&[&str]>,
    ) -> StoreResult<Vec<Record>> {
        self.record("select_where_in", table, Some(column), values);
        self.check(table)?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| values.iter().any(|v| matches_id(row, column, *v)))
            .map(|row| project(row, columns))
            .collect())
    }

    async fn insert(&self, table: &str, mut record: Record) -> StoreResult<Record> {
        self.record("insert", table, None, &[]);
        self.check(table)?;
        if !record.contains_key("id") {
            record.insert("id".into(), json!(Uuid::new_v4().to_string()));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: Uuid, patch: Record) -> StoreResult<Record> {
        self.record("update", table, Some("id"), &[id]);
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|row| matches_id(row, "id", id)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;
        for (key, value) in patch {
            row.insert(key, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, id: Uuid) -> StoreResult<u64> {
        self.record("delete", table, Some("id"), &[id]);
        self.check(table)?;
        Ok(remove_where(&self.tables, table, "id", &[id]))
    }

    async fn delete_where_in(
        &self,
        table: &str,
        column: &str,
        values: &[Uuid],
    ) -> StoreResult<u64> {
        self.record("delete_where_in", table, Some(column), values);
        self.check(table)?;
        Ok(remove_where(&self.tables, table, column, values))
    }
}

fn remove_where(
    tables: &Mutex<HashMap<String, Vec<Record>>>,
    table: &str,
    column: &str,
    values: &[Uuid],
) -> u64 {
    let mut tables = tables.lock().unwrap();
    let Some(rows) = tables.get_mut(table) else {
        return 0;
    };
    let before = rows.len();
    rows.retain(|row| !values.iter().any(|v| matches_id(row, column, *v)));
    (before - rows.len()) as u64
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

pub fn test_config(strict_validation: bool) -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgres://test@localhost/tokencore_test".into(),
            max_connections: 2,
            min_connections: 0,
            acquire_timeout_secs: 1,
            idle_timeout_secs: 10,
        },
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            allow_degraded_start: true,
            frontend_url: None,
        },
        logging: LoggingConfig {
            level: "debug".into(),
            format: "text".into(),
        },
        crud: CrudConfig { strict_validation },
    }
}

/// 基于内存存储的服务
pub fn service(store: &Arc<InMemoryRowStore>) -> TokenCrudService {
    TokenCrudService::new(store.clone())
}

/// 基于内存存储的应用状态
pub fn app_state(store: &Arc<InMemoryRowStore>, strict_validation: bool) -> Arc<AppState> {
    Arc::new(AppState::with_store(
        store.clone(),
        Arc::new(test_config(strict_validation)),
    ))
}
