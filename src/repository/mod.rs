// Repository 抽象层
pub mod pg_row_store;
pub mod row_store;

pub use pg_row_store::PgRowStore;
pub use row_store::{RowStore, StoreError, StoreResult};
