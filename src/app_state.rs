use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::db::PgPool,
    repository::{pg_row_store::PgRowStore, row_store::RowStore},
    service::token_crud_service::TokenCrudService,
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    /// 降级启动（数据库不可用）时为 `None`
    pub pool: Option<PgPool>,
    pub config: Arc<Config>,
    pub token_service: Arc<TokenCrudService>,
}

impl AppState {
    /// 基于 Postgres 连接池创建应用状态
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        let store: Arc<dyn RowStore> = Arc::new(PgRowStore::new(pool.clone()));
        let mut state = Self::with_store(store, config);
        state.pool = Some(pool);
        state
    }

    /// 使用任意行存储创建应用状态（测试中注入内存实现）
    pub fn with_store(store: Arc<dyn RowStore>, config: Arc<Config>) -> Self {
        let token_service = Arc::new(
            TokenCrudService::new(store).with_strict_validation(config.crud.strict_validation),
        );

        Self {
            pool: None,
            config,
            token_service,
        }
    }
}
