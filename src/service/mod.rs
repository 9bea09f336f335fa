pub mod partition_resolver; // 分区子表两步查询
pub mod token_crud_service;

pub use partition_resolver::{PartitionResolver, TableData};
pub use token_crud_service::{CrudError, CrudResult, TokenCrudService};
