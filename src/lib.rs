//! TokenCore - 代币 schema 映射与 CRUD 编排
//!
//! 把 UI 侧的代币配置（按标准划分的多张表、模块选择）映射到扁平的关系表，
//! 并对上层提供按标准整体加载、逐表增删改查的编排服务。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{ModuleSelection, Record, TokenStandard, TokenStatus},
        error::{AppError, AppErrorCode},
        repository::row_store::RowStore,
        service::token_crud_service::TokenCrudService,
    };
}
