//! 代币生命周期状态
//!
//! Draft → UnderReview → Approved → ReadyToMint → Minted → Deployed → {Paused, Distributed}
//! 审核阶段可被 Rejected。状态写入由调用方驱动，通用更新路径不强制校验，
//! 只有 `transition_status` 操作使用 [`TokenStatus::can_transition_to`] 把关。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 代币状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    #[default]
    Draft,
    UnderReview,
    Approved,
    ReadyToMint,
    Minted,
    Deployed,
    Paused,
    Distributed,
    Rejected,
}

impl TokenStatus {
    /// 是否为终态
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Distributed | Self::Rejected)
    }

    /// 校验状态转换合法性
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use TokenStatus::*;

        match (self, target) {
            (Draft, UnderReview) => true,

            (UnderReview, Approved) | (UnderReview, Rejected) | (UnderReview, Draft) => true,

            (Approved, ReadyToMint) | (Approved, Rejected) => true,

            (ReadyToMint, Minted) => true,

            (Minted, Deployed) => true,

            (Deployed, Paused) | (Deployed, Distributed) => true,

            (Paused, Deployed) | (Paused, Distributed) => true,

            // 被驳回后可以回到草稿重新编辑
            (Rejected, Draft) => true,

            _ => false,
        }
    }

    /// 从数据库字符串解析，大小写和分隔符不敏感
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "DRAFT" => Some(Self::Draft),
            "UNDER_REVIEW" | "REVIEW" => Some(Self::UnderReview),
            "APPROVED" => Some(Self::Approved),
            "READY_TO_MINT" => Some(Self::ReadyToMint),
            "MINTED" => Some(Self::Minted),
            "DEPLOYED" => Some(Self::Deployed),
            "PAUSED" => Some(Self::Paused),
            "DISTRIBUTED" => Some(Self::Distributed),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::ReadyToMint => "READY_TO_MINT",
            Self::Minted => "MINTED",
            Self::Deployed => "DEPLOYED",
            Self::Paused => "PAUSED",
            Self::Distributed => "DISTRIBUTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
