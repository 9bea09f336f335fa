//! 代币标准定义
//!
//! 六种互不兼容的代币 schema，每种标准拥有自己的属性表和子表集合。
//! 标准名在 UI 与数据库中大小写、分隔符都不统一（`ERC-20`、`erc20`、`ERC_20`），
//! 所有注册表查询前必须先经过 [`TokenStandard::parse`] 规范化。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 代币标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStandard {
    /// 同质化代币
    Erc20,
    /// 非同质化代币
    Erc721,
    /// 多代币
    Erc1155,
    /// 证券型代币（分区账本）
    Erc1400,
    /// 半同质化代币（slot）
    Erc3525,
    /// 收益金库
    Erc4626,
}

impl TokenStandard {
    pub const ALL: [TokenStandard; 6] = [
        Self::Erc20,
        Self::Erc721,
        Self::Erc1155,
        Self::Erc1400,
        Self::Erc3525,
        Self::Erc4626,
    ];

    /// 规范化解析
    ///
    /// 去掉空白、`-`、`_` 并转小写后匹配；无法识别返回 `None`，调用方不应视为致命错误。
    ///
    /// ```rust
    /// # use tokencore::domain::token_standard::TokenStandard;
    /// assert_eq!(TokenStandard::parse("ERC-20"), Some(TokenStandard::Erc20));
    /// assert_eq!(TokenStandard::parse(" erc_1400 "), Some(TokenStandard::Erc1400));
    /// assert_eq!(TokenStandard::parse("bep20"), None);
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        let digits = normalized.strip_prefix("erc").unwrap_or(&normalized);
        match digits {
            "20" => Some(Self::Erc20),
            "721" => Some(Self::Erc721),
            "1155" => Some(Self::Erc1155),
            "1400" => Some(Self::Erc1400),
            "3525" => Some(Self::Erc3525),
            "4626" => Some(Self::Erc4626),
            _ => None,
        }
    }

    /// 规范名称（小写，用于内部处理和表名拼接）
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Erc20 => "erc20",
            Self::Erc721 => "erc721",
            Self::Erc1155 => "erc1155",
            Self::Erc1400 => "erc1400",
            Self::Erc3525 => "erc3525",
            Self::Erc4626 => "erc4626",
        }
    }

    /// `tokens.standard` 列中的存储形式
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Erc20 => "ERC-20",
            Self::Erc721 => "ERC-721",
            Self::Erc1155 => "ERC-1155",
            Self::Erc1400 => "ERC-1400",
            Self::Erc3525 => "ERC-3525",
            Self::Erc4626 => "ERC-4626",
        }
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}
