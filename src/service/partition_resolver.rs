//! 分区表解析器
//!
//! 绝大多数子表直接挂在 `token_id` 上；ERC-1400 的三张分区子表挂在 `partition_id` 上，
//! 查询需要两步：先查该代币的分区 id，再按 `partition_id IN (...)` 查子表。
//! 代币没有任何分区时返回空列表，不是错误。

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    domain::{
        table_registry::{self, PARTITIONS_TABLE, TOKENS_TABLE},
        Record,
    },
    repository::row_store::{record_id, RowStore, StoreResult},
};

/// 单表读取结果：根表是单行，其余是行列表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableData {
    Single(Option<Record>),
    Rows(Vec<Record>),
}

impl TableData {
    /// 该表加载失败时的空默认值
    pub fn empty_for(table: &str) -> Self {
        if table == TOKENS_TABLE {
            Self::Single(None)
        } else {
            Self::Rows(Vec::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(row) => row.is_none(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }

    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Self::Single(row) => row.into_iter().collect(),
            Self::Rows(rows) => rows,
        }
    }

    pub(crate) fn rows_mut(&mut self) -> Box<dyn Iterator<Item = &mut Record> + '_> {
        match self {
            Self::Single(row) => Box::new(row.iter_mut()),
            Self::Rows(rows) => Box::new(rows.iter_mut()),
        }
    }
}

/// 分区表解析器
#[derive(Clone)]
pub struct PartitionResolver {
    store: Arc<dyn RowStore>,
}

impl PartitionResolver {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// 是否为分区子表
    pub fn is_partition_scoped(&self, table: &str) -> bool {
        table_registry::is_partition_scoped(table)
    }

    /// 代币名下所有分区的主键
    pub async fn partition_ids(&self, token_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let rows = self
            .store
            .select_where(PARTITIONS_TABLE, "token_id", token_id, Some(&["id"]))
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(id) = record_id(PARTITIONS_TABLE, row)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// 读取某代币在某张表中的数据
    pub async fn load_children(&self, table: &str, token_id: Uuid) -> StoreResult<TableData> {
        if self.is_partition_scoped(table) {
            let partition_ids = self.partition_ids(token_id).await?;
            if partition_ids.is_empty() {
                tracing::debug!(table = %table, token_id = %token_id, "token has no partitions");
                return Ok(TableData::Rows(Vec::new()));
            }

            let rows = self
                .store
                .select_where_in(table, "partition_id", &partition_ids, None)
                .await?;
            return Ok(TableData::Rows(rows));
        }

        if table_registry::has_token_id_column(table) {
            let rows = self.store.select_where(table, "token_id", token_id, None).await?;
            return Ok(TableData::Rows(rows));
        }

        let row = self.store.select_by_id(table, token_id, None).await?;
        Ok(TableData::Single(row))
    }

    /// 删除某代币在某张表中的全部数据，返回删除行数
    pub async fn delete_children(&self, table: &str, token_id: Uuid) -> StoreResult<u64> {
        if self.is_partition_scoped(table) {
            let partition_ids = self.partition_ids(token_id).await?;
            return self
                .store
                .delete_where_in(table, "partition_id", &partition_ids)
                .await;
        }

        if table_registry::has_token_id_column(table) {
            return self
                .store
                .delete_where_in(table, "token_id", &[token_id])
                .await;
        }

        self.store.delete(table, token_id).await
    }
}
