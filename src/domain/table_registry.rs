//! 标准 → 数据表注册表
//!
//! 每种标准由 `tokens` 根表、一张一对一属性表和若干子表组成。
//! 新增标准只需要在这里加数据，不需要新增代码路径。
//!
//! 外键布局：
//! - `tokens` 是根表，按主键 `id` 读取
//! - ERC-1400 的三张分区子表挂在 `partition_id` 上
//! - 其余所有表都挂在 `token_id` 上

use super::token_standard::TokenStandard;

/// 根表
pub const TOKENS_TABLE: &str = "tokens";

/// ERC-1400 分区表（本身挂在 `token_id` 上）
pub const PARTITIONS_TABLE: &str = "token_erc1400_partitions";

/// 以 `partition_id` 为外键的分区子表，恰好三张
pub const PARTITION_SCOPED_TABLES: [&str; 3] = [
    "token_erc1400_partition_balances",
    "token_erc1400_partition_operators",
    "token_erc1400_partition_transfers",
];

const ERC20_TABLES: &[&str] = &["token_erc20_properties"];

const ERC721_TABLES: &[&str] = &[
    "token_erc721_properties",
    "token_erc721_attributes",
    "token_erc721_mint_phases",
    "token_erc721_trait_definitions",
];

const ERC1155_TABLES: &[&str] = &[
    "token_erc1155_properties",
    "token_erc1155_types",
    "token_erc1155_balances",
    "token_erc1155_uri_mappings",
    "token_erc1155_crafting_recipes",
    "token_erc1155_discount_tiers",
    "token_erc1155_type_configs",
];

const ERC1400_TABLES: &[&str] = &[
    "token_erc1400_properties",
    PARTITIONS_TABLE,
    "token_erc1400_controllers",
    "token_erc1400_documents",
    "token_erc1400_corporate_actions",
    "token_erc1400_custody_providers",
    "token_erc1400_regulatory_filings",
    "token_erc1400_partition_balances",
    "token_erc1400_partition_operators",
    "token_erc1400_partition_transfers",
];

const ERC3525_TABLES: &[&str] = &[
    "token_erc3525_properties",
    "token_erc3525_slots",
    "token_erc3525_allocations",
    "token_erc3525_payment_schedules",
    "token_erc3525_value_adjustments",
    "token_erc3525_slot_configs",
];

const ERC4626_TABLES: &[&str] = &[
    "token_erc4626_properties",
    "token_erc4626_strategy_params",
    "token_erc4626_asset_allocations",
    "token_erc4626_vault_strategies",
    "token_erc4626_fee_tiers",
    "token_erc4626_performance_metrics",
];

/// 某标准的属性表及子表（不含根表），第一项总是属性表
pub fn standard_tables(standard: TokenStandard) -> &'static [&'static str] {
    match standard {
        TokenStandard::Erc20 => ERC20_TABLES,
        TokenStandard::Erc721 => ERC721_TABLES,
        TokenStandard::Erc1155 => ERC1155_TABLES,
        TokenStandard::Erc1400 => ERC1400_TABLES,
        TokenStandard::Erc3525 => ERC3525_TABLES,
        TokenStandard::Erc4626 => ERC4626_TABLES,
    }
}

/// 加载某标准代币需要的全部表，总是以 `tokens` 开头
///
/// 未识别的标准只返回根表，不报错。
pub fn tables_for_standard(standard: &str) -> Vec<&'static str> {
    let mut tables = vec![TOKENS_TABLE];
    match TokenStandard::parse(standard) {
        Some(standard) => tables.extend_from_slice(standard_tables(standard)),
        None => {
            tracing::debug!(standard = %standard, "unknown token standard, returning base table only");
        }
    }
    tables
}

/// 属性表名
pub fn properties_table(standard: TokenStandard) -> &'static str {
    standard_tables(standard)[0]
}

/// 属性表 → 标准（反向查询，用于写路径识别 moduleSelection）
pub fn standard_for_properties_table(table: &str) -> Option<TokenStandard> {
    TokenStandard::ALL
        .into_iter()
        .find(|standard| properties_table(*standard) == table)
}

/// 是否为分区子表
pub fn is_partition_scoped(table: &str) -> bool {
    PARTITION_SCOPED_TABLES.contains(&table)
}

/// 是否带 `token_id` 外键列
pub fn has_token_id_column(table: &str) -> bool {
    table != TOKENS_TABLE && !is_partition_scoped(table)
}

/// 注册表中所有表（根表在前）
pub fn all_tables() -> Vec<&'static str> {
    let mut tables = vec![TOKENS_TABLE];
    for standard in TokenStandard::ALL {
        tables.extend_from_slice(standard_tables(standard));
    }
    tables
}

/// 是否为注册表已知的表
pub fn is_known_table(table: &str) -> bool {
    table == TOKENS_TABLE
        || TokenStandard::ALL
            .into_iter()
            .any(|standard| standard_tables(standard).contains(&table))
}
