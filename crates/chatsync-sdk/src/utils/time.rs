//! 时间工具
//!
//! 所有时间字段统一使用 UTC 毫秒时间戳。

use chrono::{TimeZone, Utc};

/// 当前 UTC 毫秒时间戳
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 将毫秒时间戳格式化为 RFC3339（仅用于日志）
pub fn format_millis(ts: i64) -> String {
    match Utc.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.to_rfc3339(),
        None => format!("invalid({})", ts),
    }
}
