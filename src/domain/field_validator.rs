//! 通用字段校验器
//!
//! 由声明式的表 schema（必填字段 + 字段类型规则）驱动，一个引擎覆盖所有表。
//! 校验结果以数据形式返回（字段 → 错误列表），从不抛错，是否拦截保存由调用方决定。
//!
//! 没有 schema 的表按“无必填、无类型规则”处理，总是通过。
//! 对这些长尾表，校验器只是建议性的，不能作为唯一的完整性保障。

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde_json::Value;

use super::Record;

/// 字段基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

/// 字段类型规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub field_type: FieldType,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FieldRule {
    pub const fn string() -> Self {
        Self {
            field_type: FieldType::String,
            max_length: None,
            min: None,
            max: None,
        }
    }

    pub const fn string_max(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::string()
        }
    }

    pub const fn number() -> Self {
        Self {
            field_type: FieldType::Number,
            max_length: None,
            min: None,
            max: None,
        }
    }

    pub const fn number_range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::number()
        }
    }

    pub const fn boolean() -> Self {
        Self {
            field_type: FieldType::Boolean,
            max_length: None,
            min: None,
            max: None,
        }
    }
}

/// 单表 schema
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub required: &'static [&'static str],
    pub fields: Vec<(&'static str, FieldRule)>,
    /// 软删除标记列（有则删除操作改为置位）
    pub soft_delete_column: Option<&'static str>,
}

impl TableSchema {
    fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, rule)| rule)
    }
}

/// 字段 → 错误消息列表；空表示通过
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

const PERCENT: FieldRule = FieldRule::number_range(Some(0.0), Some(100.0));
const NON_NEGATIVE: FieldRule = FieldRule::number_range(Some(0.0), None);
const ADDRESS: FieldRule = FieldRule::string_max(100);
const URI: FieldRule = FieldRule::string_max(2048);

static SCHEMAS: Lazy<HashMap<&'static str, TableSchema>> = Lazy::new(|| {
    let mut schemas = HashMap::new();

    schemas.insert(
        "tokens",
        TableSchema {
            required: &["name", "symbol", "standard"],
            fields: vec![
                ("name", FieldRule::string_max(255)),
                ("symbol", FieldRule::string_max(10)),
                ("decimals", FieldRule::number_range(Some(0.0), Some(18.0))),
                ("standard", FieldRule::string_max(20)),
                ("status", FieldRule::string_max(50)),
                ("description", FieldRule::string_max(2000)),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc20_properties",
        TableSchema {
            required: &[],
            fields: vec![
                ("initial_supply", FieldRule::string_max(78)),
                ("cap", FieldRule::string_max(78)),
                ("is_mintable", FieldRule::boolean()),
                ("is_burnable", FieldRule::boolean()),
                ("is_pausable", FieldRule::boolean()),
                ("token_type", FieldRule::string_max(50)),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc721_properties",
        TableSchema {
            required: &[],
            fields: vec![
                ("base_uri", URI),
                ("metadata_storage", FieldRule::string_max(50)),
                ("max_supply", FieldRule::string_max(78)),
                ("has_royalty", FieldRule::boolean()),
                ("royalty_percentage", PERCENT),
                ("royalty_receiver", ADDRESS),
                ("is_burnable", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc721_attributes",
        TableSchema {
            required: &["trait_type"],
            fields: vec![("trait_type", FieldRule::string_max(100))],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc721_mint_phases",
        TableSchema {
            required: &["phase_name"],
            fields: vec![
                ("phase_name", FieldRule::string_max(100)),
                ("max_per_wallet", NON_NEGATIVE),
                ("max_supply", NON_NEGATIVE),
                ("is_active", FieldRule::boolean()),
                ("price", FieldRule::string_max(78)),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1155_properties",
        TableSchema {
            required: &[],
            fields: vec![
                ("base_uri", URI),
                ("has_royalty", FieldRule::boolean()),
                ("royalty_percentage", PERCENT),
                ("royalty_receiver", ADDRESS),
                ("batch_minting_enabled", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1155_types",
        TableSchema {
            required: &["token_type_id"],
            fields: vec![
                ("token_type_id", FieldRule::string_max(100)),
                ("name", FieldRule::string_max(255)),
                ("max_supply", FieldRule::string_max(78)),
                ("fungibility_type", FieldRule::string_max(50)),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1400_properties",
        TableSchema {
            required: &[],
            fields: vec![
                ("initial_supply", FieldRule::string_max(78)),
                ("cap", FieldRule::string_max(78)),
                ("security_type", FieldRule::string_max(50)),
                ("issuing_jurisdiction", FieldRule::string_max(100)),
                ("is_issuable", FieldRule::boolean()),
                ("enforce_kyc", FieldRule::boolean()),
                ("holding_period", NON_NEGATIVE),
                ("max_investor_count", NON_NEGATIVE),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1400_partitions",
        TableSchema {
            required: &["name", "partition_id"],
            fields: vec![
                ("name", FieldRule::string_max(255)),
                ("partition_id", FieldRule::string_max(100)),
                ("amount", FieldRule::string_max(78)),
                ("transferable", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1400_controllers",
        TableSchema {
            required: &["address"],
            fields: vec![("address", ADDRESS)],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1400_documents",
        TableSchema {
            required: &["name", "document_uri"],
            fields: vec![
                ("name", FieldRule::string_max(255)),
                ("document_uri", URI),
                ("document_type", FieldRule::string_max(100)),
                ("document_hash", FieldRule::string_max(132)),
                ("is_deleted", FieldRule::boolean()),
            ],
            soft_delete_column: Some("is_deleted"),
        },
    );

    schemas.insert(
        "token_erc1400_corporate_actions",
        TableSchema {
            required: &["action_type"],
            fields: vec![
                ("action_type", FieldRule::string_max(100)),
                ("status", FieldRule::string_max(50)),
                ("is_deleted", FieldRule::boolean()),
            ],
            soft_delete_column: Some("is_deleted"),
        },
    );

    schemas.insert(
        "token_erc1400_partition_balances",
        TableSchema {
            required: &["partition_id", "holder_address", "balance"],
            fields: vec![
                ("holder_address", ADDRESS),
                ("balance", FieldRule::string_max(78)),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc1400_partition_operators",
        TableSchema {
            required: &["partition_id", "holder_address", "operator_address"],
            fields: vec![
                ("holder_address", ADDRESS),
                ("operator_address", ADDRESS),
                ("authorized", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc3525_properties",
        TableSchema {
            required: &["value_decimals"],
            fields: vec![
                ("value_decimals", FieldRule::number_range(Some(0.0), Some(18.0))),
                ("base_uri", URI),
                ("slot_type", FieldRule::string_max(50)),
                ("allows_slot_enumeration", FieldRule::boolean()),
                ("value_aggregation", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc3525_slots",
        TableSchema {
            required: &["slot_id"],
            fields: vec![
                ("slot_id", FieldRule::string_max(100)),
                ("slot_name", FieldRule::string_max(255)),
                ("value_units", FieldRule::string_max(50)),
                ("slot_transferable", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc4626_properties",
        TableSchema {
            required: &["asset_address"],
            fields: vec![
                ("asset_address", ADDRESS),
                ("asset_decimals", FieldRule::number_range(Some(0.0), Some(18.0))),
                ("vault_type", FieldRule::string_max(50)),
                ("management_fee", PERCENT),
                ("performance_fee", PERCENT),
                ("deposit_limit", FieldRule::string_max(78)),
                ("is_pausable", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas.insert(
        "token_erc4626_strategy_params",
        TableSchema {
            required: &["name"],
            fields: vec![
                ("name", FieldRule::string_max(255)),
                ("value", FieldRule::string_max(1000)),
                ("param_type", FieldRule::string_max(50)),
                ("is_required", FieldRule::boolean()),
            ],
            soft_delete_column: None,
        },
    );

    schemas
});

/// 查询表 schema；没有 schema 的表返回 `None`
pub fn schema_for(table: &str) -> Option<&'static TableSchema> {
    SCHEMAS.get(table)
}

/// 表的软删除标记列
pub fn soft_delete_column(table: &str) -> Option<&'static str> {
    schema_for(table).and_then(|schema| schema.soft_delete_column)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn push_error(errors: &mut ValidationErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

fn check_rule(errors: &mut ValidationErrors, field: &str, rule: &FieldRule, value: &Value) {
    match rule.field_type {
        FieldType::String => {
            let Some(s) = value.as_str() else {
                push_error(errors, field, format!("{} must be a string", field));
                return;
            };
            if let Some(max_length) = rule.max_length {
                if s.chars().count() > max_length {
                    push_error(
                        errors,
                        field,
                        format!("{} must be at most {} characters", field, max_length),
                    );
                }
            }
        }
        FieldType::Number => {
            let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
                push_error(errors, field, format!("{} must be a number", field));
                return;
            };
            if let Some(min) = rule.min {
                if n < min {
                    push_error(errors, field, format!("{} must be at least {}", field, min));
                }
            }
            if let Some(max) = rule.max {
                if n > max {
                    push_error(errors, field, format!("{} must be at most {}", field, max));
                }
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                push_error(errors, field, format!("{} must be a boolean", field));
            }
        }
    }
}

/// 按表 schema 校验一条完整记录
pub fn validate(table: &str, record: &Record) -> ValidationErrors {
    validate_with(table, record, false)
}

/// 校验部分更新：必填字段只在出现时检查是否为空
pub fn validate_patch(table: &str, record: &Record) -> ValidationErrors {
    validate_with(table, record, true)
}

fn validate_with(table: &str, record: &Record, partial: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let Some(schema) = schema_for(table) else {
        return errors;
    };

    for field in schema.required {
        if partial && !record.contains_key(*field) {
            continue;
        }
        if is_blank(record.get(*field)) {
            push_error(&mut errors, field, format!("{} is required", field));
        }
    }

    for (field, value) in record {
        if value.is_null() || errors.contains_key(field.as_str()) {
            continue;
        }
        if let Some(rule) = schema.rule(field) {
            check_rule(&mut errors, field, rule, value);
        }
    }

    errors
}
