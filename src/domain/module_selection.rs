//! 模块选择转换器
//!
//! UI 使用嵌套结构 `{ module: { enabled, address?, config? } }` 表示启用了哪些模块，
//! 数据库只认属性表上的扁平列。本模块在两者之间做双向转换：
//!
//! - [`selection_to_columns`]：写路径。启用且有地址的模块写入地址列；
//!   曾经启用（仍带旧地址/配置）但已禁用的模块显式写 `null`，避免残留旧地址；
//!   从未启用的模块不输出任何键。
//! - [`columns_to_selection`]：读路径。非空列还原为 `{enabled: true, ...}`，
//!   其余模块直接缺省（缺省即禁用，从不输出 `enabled: false`）。
//!
//! `moduleSelection` 从不落库，写路径必须先剥离再替换为扁平列。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{module_registry, token_standard::TokenStandard, Record};

/// 记录中承载 UI 模块选择的键
pub const MODULE_SELECTION_KEY: &str = "moduleSelection";

/// 单个模块的选择状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleChoice {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ModuleChoice {
    fn has_address(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(|address| !address.trim().is_empty())
    }

    fn has_config(&self) -> bool {
        self.config.as_ref().is_some_and(|config| !config.is_null())
    }
}

/// UI 模块选择（模块名 → 选择状态）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleSelection(BTreeMap<String, ModuleChoice>);

impl ModuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启用模块并设置合约地址
    pub fn enable(&mut self, module: impl Into<String>, address: impl Into<String>) -> &mut Self {
        let choice = self.0.entry(module.into()).or_default();
        choice.enabled = true;
        choice.address = Some(address.into());
        self
    }

    /// 设置模块配置（不改变启用状态）
    pub fn configure(&mut self, module: impl Into<String>, config: Value) -> &mut Self {
        self.0.entry(module.into()).or_default().config = Some(config);
        self
    }

    /// 禁用模块，保留原地址和配置，转换时据此输出显式 `null`
    pub fn disable(&mut self, module: impl Into<String>) -> &mut Self {
        self.0.entry(module.into()).or_default().enabled = false;
        self
    }

    pub fn insert(&mut self, module: impl Into<String>, choice: ModuleChoice) {
        self.0.insert(module.into(), choice);
    }

    pub fn get(&self, module: &str) -> Option<&ModuleChoice> {
        self.0.get(module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModuleChoice)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 只保留启用且带地址或配置的条目
    pub fn enabled_subset(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, choice)| choice.enabled && (choice.has_address() || choice.has_config()))
                .map(|(name, choice)| (name.clone(), choice.clone()))
                .collect(),
        )
    }
}

/// UI 选择 → 扁平列
pub fn selection_to_columns(selection: &ModuleSelection, standard: &str) -> Record {
    let mut columns = Record::new();

    let Some(parsed) = TokenStandard::parse(standard) else {
        tracing::warn!(standard = %standard, "unknown standard, module selection ignored");
        return columns;
    };

    for (name, choice) in selection.iter() {
        let Some(spec) = module_registry::find_module(parsed, name) else {
            tracing::warn!(
                standard = %parsed,
                module = %name,
                "unknown module for standard, skipped"
            );
            continue;
        };

        if choice.enabled {
            if let Some(address) = choice.address.as_deref().map(str::trim) {
                if !address.is_empty() {
                    columns.insert(
                        spec.address_column.to_string(),
                        Value::String(address.to_string()),
                    );
                }
            }
            if let (Some(config_column), Some(config)) = (spec.config_column, &choice.config) {
                if !config.is_null() {
                    columns.insert(config_column.to_string(), config.clone());
                }
            }
        } else if choice.has_address() || choice.has_config() {
            columns.insert(spec.address_column.to_string(), Value::Null);
            if let Some(config_column) = spec.config_column {
                columns.insert(config_column.to_string(), Value::Null);
            }
        }
    }

    columns
}

/// 扁平列 → UI 选择
pub fn columns_to_selection(columns: &Record, standard: &str) -> ModuleSelection {
    let mut selection = ModuleSelection::new();

    let Some(parsed) = TokenStandard::parse(standard) else {
        return selection;
    };

    for spec in module_registry::modules_for_standard(parsed) {
        let address = columns
            .get(spec.address_column)
            .and_then(Value::as_str)
            .filter(|address| !address.is_empty())
            .map(str::to_string);
        let config = spec
            .config_column
            .and_then(|column| columns.get(column))
            .filter(|config| !config.is_null())
            .cloned();

        if address.is_none() && config.is_none() {
            continue;
        }

        selection.insert(
            spec.name,
            ModuleChoice {
                enabled: true,
                address,
                config,
            },
        );
    }

    selection
}

/// 从待写记录中剥离 `moduleSelection` 并合并为扁平列
///
/// 选择存在时，它对该标准的模块列具有最终决定权：记录中已显式给出的列会被
/// 转换结果覆盖，未启用模块仍回传的列一律置 `null`。格式错误的选择只告警并丢弃。
pub fn strip_module_selection(record: &mut Record, standard: &str) {
    let Some(raw) = record.remove(MODULE_SELECTION_KEY) else {
        return;
    };
    if raw.is_null() {
        return;
    }

    match serde_json::from_value::<ModuleSelection>(raw) {
        Ok(selection) => {
            record.extend(selection_to_columns(&selection, standard));
            clear_disabled_columns(record, &selection, standard);
        }
        Err(e) => {
            tracing::warn!(error = %e, standard = %standard, "malformed moduleSelection dropped");
        }
    }
}

/// 未启用（含缺省）模块的地址列和配置列若出现在记录中，改写为 `null`
fn clear_disabled_columns(record: &mut Record, selection: &ModuleSelection, standard: &str) {
    let Some(parsed) = TokenStandard::parse(standard) else {
        return;
    };

    for spec in module_registry::modules_for_standard(parsed) {
        if selection.get(spec.name).is_some_and(|choice| choice.enabled) {
            continue;
        }
        for column in std::iter::once(spec.address_column).chain(spec.config_column) {
            if let Some(value) = record.get_mut(column) {
                *value = Value::Null;
            }
        }
    }
}

/// 为读出的属性行附加还原后的 `moduleSelection`
pub fn attach_module_selection(row: &mut Record, standard: &str) {
    let selection = columns_to_selection(row, standard);
    match serde_json::to_value(&selection) {
        Ok(value) => {
            row.insert(MODULE_SELECTION_KEY.to_string(), value);
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize moduleSelection");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_erc20_scenario() {
        let selection: ModuleSelection = serde_json::from_value(json!({
            "compliance": { "enabled": true, "address": "0xAA" },
            "fees": { "enabled": false }
        }))
        .unwrap();

        let columns = selection_to_columns(&selection, "erc20");
        assert_eq!(columns, record(json!({ "compliance_module_address": "0xAA" })));
    }

    #[test]
    fn test_disable_after_enable_emits_null() {
        let mut selection = ModuleSelection::new();
        selection.enable("compliance", "0xA1");
        selection.disable("compliance");

        let columns = selection_to_columns(&selection, "ERC-20");
        assert_eq!(
            columns,
            record(json!({
                "compliance_module_address": null,
                "compliance_config": null
            }))
        );
    }

    #[test]
    fn test_enabled_without_address_is_omitted() {
        let mut selection = ModuleSelection::new();
        selection.insert(
            "votes",
            ModuleChoice {
                enabled: true,
                address: Some("   ".into()),
                config: None,
            },
        );
        assert!(selection_to_columns(&selection, "erc20").is_empty());
    }

    #[test]
    fn test_unknown_module_is_skipped() {
        let mut selection = ModuleSelection::new();
        selection.enable("royalty", "0xBB");
        selection.enable("permit", "0xCC");

        let columns = selection_to_columns(&selection, "erc20");
        assert_eq!(columns, record(json!({ "permit_module_address": "0xCC" })));
    }

    #[test]
    fn test_unknown_standard_yields_nothing() {
        let mut selection = ModuleSelection::new();
        selection.enable("compliance", "0xAA");
        assert!(selection_to_columns(&selection, "bep20").is_empty());
        assert!(columns_to_selection(&record(json!({"compliance_module_address": "0xAA"})), "bep20").is_empty());
    }

    #[test]
    fn test_config_module_round_trip() {
        let mut selection = ModuleSelection::new();
        selection.enable("royalty", "0xR0");
        selection.configure("royalty", json!({ "bps": 250 }));

        let columns = selection_to_columns(&selection, "erc721");
        assert_eq!(columns.get("royalty_config"), Some(&json!({ "bps": 250 })));
        assert_eq!(columns_to_selection(&columns, "erc721"), selection);
    }

    #[test]
    fn test_round_trip_keeps_enabled_subset() {
        let mut selection = ModuleSelection::new();
        selection.enable("compliance", "0x01");
        selection.enable("router", "0x02");
        selection.insert("native_vault", ModuleChoice::default());
        selection.insert(
            "async_vault",
            ModuleChoice {
                enabled: true,
                address: None,
                config: None,
            },
        );

        let columns = selection_to_columns(&selection, "erc4626");
        let restored = columns_to_selection(&columns, "erc4626");
        assert_eq!(restored, selection.enabled_subset());
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn test_columns_to_selection_never_emits_disabled() {
        let columns = record(json!({
            "compliance_module_address": "0xAA",
            "vesting_module_address": null,
            "fees_module_address": ""
        }));
        let selection = columns_to_selection(&columns, "erc20");
        assert_eq!(selection.len(), 1);
        assert!(selection.get("compliance").unwrap().enabled);
        assert!(selection.get("vesting").is_none());
    }

    #[test]
    fn test_strip_module_selection_merges_columns() {
        let mut row = record(json!({
            "initial_supply": "1000",
            "moduleSelection": {
                "compliance": { "enabled": true, "address": "0xAA" },
                "snapshot": { "enabled": false, "address": "0xOLD" }
            }
        }));
        strip_module_selection(&mut row, "erc20");

        assert!(!row.contains_key(MODULE_SELECTION_KEY));
        assert_eq!(row.get("compliance_module_address"), Some(&json!("0xAA")));
        assert_eq!(row.get("snapshot_module_address"), Some(&Value::Null));
        assert_eq!(row.get("initial_supply"), Some(&json!("1000")));
    }

    #[test]
    fn test_strip_nulls_echoed_columns_of_disabled_modules() {
        let mut row = record(json!({
            "compliance_module_address": "0xAA",
            "compliance_config": { "kyc": true },
            "permit_module_address": "0xPP",
            "moduleSelection": {
                "compliance": { "enabled": false },
                "fees": { "enabled": true, "address": "0xFF" }
            }
        }));
        strip_module_selection(&mut row, "erc20");

        assert_eq!(row.get("compliance_module_address"), Some(&Value::Null));
        assert_eq!(row.get("compliance_config"), Some(&Value::Null));
        assert_eq!(row.get("permit_module_address"), Some(&Value::Null));
        assert_eq!(row.get("fees_module_address"), Some(&json!("0xFF")));
        assert!(!row.contains_key("vesting_module_address"));
    }

    #[test]
    fn test_strip_malformed_selection() {
        let mut row = record(json!({ "moduleSelection": "garbage" }));
        strip_module_selection(&mut row, "erc20");
        assert!(row.is_empty());
    }

    #[test]
    fn test_attach_module_selection() {
        let mut row = record(json!({ "vesting_module_address": "0xVV" }));
        attach_module_selection(&mut row, "erc1155");
        assert_eq!(
            row.get(MODULE_SELECTION_KEY),
            Some(&json!({ "vesting": { "enabled": true, "address": "0xVV" } }))
        );
    }
}
