//! 代币 CRUD 编排服务
//!
//! 组合表注册表、模块选择转换、字段校验和分区解析，对 UI 提供
//! 创建/读取/更新/删除/整体加载操作。服务本身无状态，每次调用独立计算、独立访问存储，
//! 不同标签页并发调用互不影响；同一调用内的多条记录按顺序逐条写入。
//!
//! 单记录操作的存储错误原样向上传播，从不吞掉；只有 `load_standard_tables`
//! 对单表失败做降级（记录告警并填入空默认值），保证一张坏表不影响查看其余数据。

use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

use super::partition_resolver::{PartitionResolver, TableData};
use crate::{
    domain::{
        field_validator::{self, ValidationErrors},
        module_selection,
        table_registry::{self, TOKENS_TABLE},
        Record, TokenStandard, TokenStatus,
    },
    repository::row_store::{record_id, RowStore, StoreError},
    utils::time_utils::now_rfc3339,
};

/// 编排层错误
#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 仅在严格校验模式下出现；每条记录一个错误表，顺序与入参一致
    #[error("validation failed for {table}")]
    Validation {
        table: String,
        errors: Vec<ValidationErrors>,
    },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("token {0} not found")]
    TokenNotFound(Uuid),

    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition { from: String, to: TokenStatus },
}

pub type CrudResult<T> = Result<T, CrudError>;

/// 整体加载结果（表名 → 数据）
pub type StandardTables = BTreeMap<String, TableData>;

/// 代币 CRUD 编排服务
pub struct TokenCrudService {
    store: Arc<dyn RowStore>,
    resolver: PartitionResolver,
    strict_validation: bool,
}

impl TokenCrudService {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            resolver: PartitionResolver::new(store.clone()),
            store,
            strict_validation: false,
        }
    }

    /// 严格模式：校验失败的写入在访问存储前被拒绝
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn resolver(&self) -> &PartitionResolver {
        &self.resolver
    }

    // ============ 读 ============

    /// 读取代币根记录
    pub async fn get_token(&self, token_id: Uuid) -> CrudResult<Option<Record>> {
        let token = self.store.select_by_id(TOKENS_TABLE, token_id, None).await?;
        Ok(token)
    }

    /// 读取代币在某张表中的数据，属性表行附带还原的 `moduleSelection`
    pub async fn get_table_rows(&self, table: &str, token_id: Uuid) -> CrudResult<TableData> {
        let mut data = self.resolver.load_children(table, token_id).await?;
        attach_selection_if_properties(table, &mut data);
        Ok(data)
    }

    /// 按标准加载全部表
    ///
    /// 单表失败不会中断整体加载：记录告警，该表位置填入空默认值。
    pub async fn load_standard_tables(
        &self,
        token_id: Uuid,
        standard: &str,
    ) -> StandardTables {
        let mut result = StandardTables::new();

        for table in table_registry::tables_for_standard(standard) {
            let data = match self.get_table_rows(table, token_id).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        table = %table,
                        token_id = %token_id,
                        error = %e,
                        "partial load failure, substituting empty default"
                    );
                    TableData::empty_for(table)
                }
            };
            result.insert(table.to_string(), data);
        }

        tracing::debug!(
            token_id = %token_id,
            standard = %standard,
            tables = result.len(),
            "standard tables loaded"
        );
        result
    }

    /// 先读根记录取得标准，再整体加载
    pub async fn load_token_bundle(&self, token_id: Uuid) -> CrudResult<StandardTables> {
        let token = self
            .get_token(token_id)
            .await?
            .ok_or(CrudError::TokenNotFound(token_id))?;

        let standard = token
            .get("standard")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(self.load_standard_tables(token_id, &standard).await)
    }

    // ============ 校验 ============

    /// 校验一批记录，返回与入参顺序一致的错误表
    pub fn validate_rows(&self, table: &str, records: &[Record]) -> Vec<ValidationErrors> {
        records
            .iter()
            .map(|record| field_validator::validate(table, record))
            .collect()
    }

    fn enforce(&self, table: &str, errors: Vec<ValidationErrors>) -> CrudResult<()> {
        if errors.iter().all(ValidationErrors::is_empty) {
            return Ok(());
        }

        if self.strict_validation {
            return Err(CrudError::Validation {
                table: table.to_string(),
                errors,
            });
        }

        let failing = errors.iter().filter(|e| !e.is_empty()).count();
        tracing::warn!(
            table = %table,
            failing_records = failing,
            "validation errors on write, proceeding (advisory mode)"
        );
        Ok(())
    }

    // ============ 写 ============

    /// 创建代币根记录
    ///
    /// 缺省 `blocks = {}`、`status = DRAFT`；可识别的标准名统一为存储形式。
    pub async fn create_token(&self, record: Record) -> CrudResult<Record> {
        let mut record = record;
        record.remove("id");
        normalize_token_fields(&mut record);
        record
            .entry("status")
            .or_insert_with(|| Value::String(TokenStatus::Draft.to_db_string().to_string()));
        if record.get("blocks").map_or(true, Value::is_null) {
            record.insert("blocks".to_string(), Value::Object(Record::new()));
        }
        stamp_created(&mut record);

        self.enforce(
            TOKENS_TABLE,
            vec![field_validator::validate(TOKENS_TABLE, &record)],
        )?;

        let created = self.store.insert(TOKENS_TABLE, record).await?;
        tracing::info!(token_id = ?created.get("id"), "token created");
        Ok(created)
    }

    /// 更新代币根记录（部分字段），不校验状态转换合法性
    pub async fn update_token(&self, token_id: Uuid, patch: Record) -> CrudResult<Record> {
        let mut patch = patch;
        patch.remove("id");
        patch.remove("created_at");
        normalize_token_fields(&mut patch);
        stamp_updated(&mut patch);

        self.enforce(
            TOKENS_TABLE,
            vec![field_validator::validate_patch(TOKENS_TABLE, &patch)],
        )?;

        let updated = self.store.update(TOKENS_TABLE, token_id, patch).await?;
        tracing::debug!(token_id = %token_id, "token updated");
        Ok(updated)
    }

    /// 受状态机约束的状态变更
    pub async fn transition_status(
        &self,
        token_id: Uuid,
        target: TokenStatus,
    ) -> CrudResult<Record> {
        let token = self
            .get_token(token_id)
            .await?
            .ok_or(CrudError::TokenNotFound(token_id))?;

        let current_raw = token
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let current = TokenStatus::parse(&current_raw).ok_or_else(|| {
            CrudError::IllegalTransition {
                from: current_raw.clone(),
                to: target,
            }
        })?;

        if !current.can_transition_to(&target) {
            return Err(CrudError::IllegalTransition {
                from: current.to_db_string().to_string(),
                to: target,
            });
        }

        let mut patch = Record::new();
        patch.insert(
            "status".to_string(),
            Value::String(target.to_db_string().to_string()),
        );
        stamp_updated(&mut patch);

        let updated = self.store.update(TOKENS_TABLE, token_id, patch).await?;
        tracing::info!(token_id = %token_id, from = %current, to = %target, "token status changed");
        Ok(updated)
    }

    /// 为某代币批量新增子记录，逐条顺序写入
    pub async fn create_rows(
        &self,
        table: &str,
        token_id: Uuid,
        records: Vec<Record>,
    ) -> CrudResult<Vec<Record>> {
        let prepared: Vec<Record> = records
            .into_iter()
            .map(|record| prepare_insert(table, token_id, record))
            .collect();

        self.enforce(table, self.validate_rows(table, &prepared))?;

        let mut created = Vec::with_capacity(prepared.len());
        for record in prepared {
            created.push(self.store.insert(table, record).await?);
        }

        tracing::debug!(table = %table, token_id = %token_id, count = created.len(), "rows created");
        Ok(created)
    }

    /// 批量 upsert：带 id 的记录更新，不带 id 的记录注入 `token_id` 后插入
    ///
    /// 逐条顺序执行，每条一次往返；任一条失败立即返回错误，之前的写入不回滚。
    pub async fn update_rows(
        &self,
        table: &str,
        token_id: Uuid,
        records: Vec<Record>,
    ) -> CrudResult<Vec<Record>> {
        enum Write {
            Update(Uuid, Record),
            Insert(Record),
        }

        let mut writes = Vec::with_capacity(records.len());
        let mut errors = Vec::with_capacity(records.len());
        for record in records {
            let id = record_id(table, &record)
                .map_err(|e| CrudError::InvalidRecord(e.to_string()))?;
            match id {
                Some(id) => {
                    let patch = prepare_update(table, record);
                    errors.push(field_validator::validate_patch(table, &patch));
                    writes.push(Write::Update(id, patch));
                }
                None => {
                    let record = prepare_insert(table, token_id, record);
                    errors.push(field_validator::validate(table, &record));
                    writes.push(Write::Insert(record));
                }
            }
        }
        self.enforce(table, errors)?;

        let mut saved = Vec::with_capacity(writes.len());
        for write in writes {
            let row = match write {
                Write::Update(id, patch) => self.store.update(table, id, patch).await?,
                Write::Insert(record) => self.store.insert(table, record).await?,
            };
            saved.push(row);
        }

        tracing::debug!(table = %table, token_id = %token_id, count = saved.len(), "rows saved");
        Ok(saved)
    }

    /// 删除某代币在某张表中的全部数据
    pub async fn delete_rows(&self, table: &str, token_id: Uuid) -> CrudResult<u64> {
        let deleted = self.resolver.delete_children(table, token_id).await?;
        tracing::debug!(table = %table, token_id = %token_id, deleted, "rows deleted");
        Ok(deleted)
    }

    /// 删除单行；表声明了软删除列时改为置位
    pub async fn delete_row(&self, table: &str, row_id: Uuid) -> CrudResult<()> {
        if let Some(column) = field_validator::soft_delete_column(table) {
            let mut patch = Record::new();
            patch.insert(column.to_string(), Value::Bool(true));
            stamp_updated(&mut patch);
            self.store.update(table, row_id, patch).await?;
            tracing::debug!(table = %table, row_id = %row_id, "row soft-deleted");
            return Ok(());
        }

        let affected = self.store.delete(table, row_id).await?;
        if affected == 0 {
            tracing::debug!(table = %table, row_id = %row_id, "delete matched no rows");
        }
        Ok(())
    }
}

/// 标准名统一为存储形式，无法识别的保持原样交给校验器
fn normalize_token_fields(record: &mut Record) {
    if let Some(Value::String(raw)) = record.get("standard") {
        if let Some(standard) = TokenStandard::parse(raw) {
            record.insert(
                "standard".to_string(),
                Value::String(standard.as_db_str().to_string()),
            );
        }
    }
}

fn stamp_created(record: &mut Record) {
    let now = Value::String(now_rfc3339());
    record.insert("created_at".to_string(), now.clone());
    record.insert("updated_at".to_string(), now);
}

fn stamp_updated(record: &mut Record) {
    record.insert("updated_at".to_string(), Value::String(now_rfc3339()));
}

/// 属性表的 `moduleSelection` 剥离为扁平列；其余表只保证不带该键落库
fn strip_selection(table: &str, record: &mut Record) {
    match table_registry::standard_for_properties_table(table) {
        Some(standard) => module_selection::strip_module_selection(record, standard.canonical()),
        None => {
            if record.remove(module_selection::MODULE_SELECTION_KEY).is_some() {
                tracing::warn!(table = %table, "moduleSelection on non-properties table dropped");
            }
        }
    }
}

fn prepare_insert(table: &str, token_id: Uuid, mut record: Record) -> Record {
    record.remove("id");
    strip_selection(table, &mut record);
    if table_registry::has_token_id_column(table) {
        record.insert("token_id".to_string(), Value::String(token_id.to_string()));
    }
    stamp_created(&mut record);
    record
}

fn prepare_update(table: &str, mut record: Record) -> Record {
    record.remove("id");
    record.remove("created_at");
    strip_selection(table, &mut record);
    stamp_updated(&mut record);
    record
}

fn attach_selection_if_properties(table: &str, data: &mut TableData) {
    if let Some(standard) = table_registry::standard_for_properties_table(table) {
        for row in data.rows_mut() {
            module_selection::attach_module_selection(row, standard.canonical());
        }
    }
}
