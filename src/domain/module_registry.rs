//! 模块配置注册表
//!
//! 每种标准拥有一组固定的可选功能模块。每个模块在属性表上对应：
//! - 一个可空的合约地址列 `<module>_module_address`
//! - 部分模块另有一个可空的 JSON 配置列 `<module>_config`
//!
//! 模块集合按标准静态固定，查询不到的模块返回 `None`，
//! 旧数据或迁移中途的配置可能引用已失效的模块，调用方只跳过并告警。

use serde::Serialize;

use super::token_standard::TokenStandard;

/// 模块描述
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    /// UI 中的模块名
    pub name: &'static str,
    /// 合约地址列
    pub address_column: &'static str,
    /// JSON 配置列
    pub config_column: Option<&'static str>,
}

const fn address_module(name: &'static str, address_column: &'static str) -> ModuleSpec {
    ModuleSpec {
        name,
        address_column,
        config_column: None,
    }
}

const fn config_module(
    name: &'static str,
    address_column: &'static str,
    config_column: &'static str,
) -> ModuleSpec {
    ModuleSpec {
        name,
        address_column,
        config_column: Some(config_column),
    }
}

// 所有标准共有的模块
const COMPLIANCE: ModuleSpec =
    config_module("compliance", "compliance_module_address", "compliance_config");
const VESTING: ModuleSpec = config_module("vesting", "vesting_module_address", "vesting_config");
const DOCUMENT: ModuleSpec = address_module("document", "document_module_address");

const ERC20_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    config_module("fees", "fees_module_address", "fees_config"),
    address_module("flash_mint", "flash_mint_module_address"),
    address_module("permit", "permit_module_address"),
    address_module("snapshot", "snapshot_module_address"),
    config_module("timelock", "timelock_module_address", "timelock_config"),
    address_module("votes", "votes_module_address"),
    address_module("payable", "payable_module_address"),
    config_module(
        "temporary_approval",
        "temporary_approval_module_address",
        "temporary_approval_config",
    ),
];

const ERC721_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    config_module("royalty", "royalty_module_address", "royalty_config"),
    config_module("rental", "rental_module_address", "rental_config"),
    address_module("soulbound", "soulbound_module_address"),
    config_module("fraction", "fraction_module_address", "fraction_config"),
    address_module("consecutive", "consecutive_module_address"),
    address_module("metadata_events", "metadata_events_module_address"),
];

const ERC1155_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    config_module("royalty", "royalty_module_address", "royalty_config"),
    config_module("supply_cap", "supply_cap_module_address", "supply_cap_config"),
    address_module("uri_management", "uri_management_module_address"),
];

const ERC1400_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    config_module(
        "transfer_restrictions",
        "transfer_restrictions_module_address",
        "transfer_restrictions_config",
    ),
    config_module("controller", "controller_module_address", "controller_config"),
    address_module("erc1400_document", "erc1400_document_module_address"),
    config_module("partition", "partition_module_address", "partition_config"),
    address_module("snapshot", "snapshot_module_address"),
    config_module("timelock", "timelock_module_address", "timelock_config"),
    address_module("votes", "votes_module_address"),
    address_module("payable", "payable_module_address"),
    config_module("fees", "fees_module_address", "fees_config"),
];

const ERC3525_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    address_module("slot_approvable", "slot_approvable_module_address"),
    config_module("slot_manager", "slot_manager_module_address", "slot_manager_config"),
    config_module(
        "value_exchange",
        "value_exchange_module_address",
        "value_exchange_config",
    ),
];

const ERC4626_MODULES: &[ModuleSpec] = &[
    COMPLIANCE,
    VESTING,
    DOCUMENT,
    config_module("fee_strategy", "fee_strategy_module_address", "fee_strategy_config"),
    config_module(
        "withdrawal_queue",
        "withdrawal_queue_module_address",
        "withdrawal_queue_config",
    ),
    config_module(
        "yield_strategy",
        "yield_strategy_module_address",
        "yield_strategy_config",
    ),
    address_module("async_vault", "async_vault_module_address"),
    address_module("native_vault", "native_vault_module_address"),
    address_module("router", "router_module_address"),
    config_module(
        "multi_asset_vault",
        "multi_asset_vault_module_address",
        "multi_asset_vault_config",
    ),
];

/// 某标准的全部模块
pub fn modules_for_standard(standard: TokenStandard) -> &'static [ModuleSpec] {
    match standard {
        TokenStandard::Erc20 => ERC20_MODULES,
        TokenStandard::Erc721 => ERC721_MODULES,
        TokenStandard::Erc1155 => ERC1155_MODULES,
        TokenStandard::Erc1400 => ERC1400_MODULES,
        TokenStandard::Erc3525 => ERC3525_MODULES,
        TokenStandard::Erc4626 => ERC4626_MODULES,
    }
}

/// 查找模块描述
pub fn find_module(standard: TokenStandard, module: &str) -> Option<&'static ModuleSpec> {
    modules_for_standard(standard)
        .iter()
        .find(|spec| spec.name == module)
}

/// 模块名 → 地址列名
///
/// 标准名先规范化；标准或模块不存在都返回 `None`。
pub fn module_column(standard: &str, module: &str) -> Option<&'static str> {
    let standard = TokenStandard::parse(standard)?;
    find_module(standard, module).map(|spec| spec.address_column)
}

/// 模块名 → JSON 配置列名
pub fn module_config_column(standard: &str, module: &str) -> Option<&'static str> {
    let standard = TokenStandard::parse(standard)?;
    find_module(standard, module).and_then(|spec| spec.config_column)
}
