//! Domain 模块
//!
//! 代币 schema 映射的纯逻辑部分：标准/表/模块注册表、模块选择转换、字段校验、状态机。
//! 这里不做任何 I/O。

pub mod field_validator;
pub mod module_registry;
pub mod module_selection;
pub mod table_registry;
pub mod token_standard;
pub mod token_status;

/// 一行记录（列名 → JSON 值）
pub type Record = serde_json::Map<String, serde_json::Value>;

// Re-exports
pub use field_validator::{validate, validate_patch, ValidationErrors};
pub use module_registry::{module_column, ModuleSpec};
pub use module_selection::{
    columns_to_selection, selection_to_columns, ModuleChoice, ModuleSelection,
};
pub use table_registry::{is_partition_scoped, tables_for_standard};
pub use token_standard::TokenStandard;
pub use token_status::TokenStatus;
