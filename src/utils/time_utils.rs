//! 时间工具模块
//! 写入存储层的时间戳统一使用 RFC3339（UTC）

use chrono::{DateTime, SecondsFormat, Utc};

/// 格式化时间戳为RFC3339格式
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 当前时间的 RFC3339 字符串
pub fn now_rfc3339() -> String {
    format_timestamp(&Utc::now())
}
