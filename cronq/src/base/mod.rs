//! 基础模块
//! Base module
//!
//! 存储键名、时间格式与默认值，与 Ruby sidekiq-cron 保持兼容
//! Store key names, time format and defaults, compatible with Ruby sidekiq-cron

use chrono::{DateTime, Duration, DurationRound, TimeZone, Utc};
use std::fmt::Display;

pub mod constants;
pub mod keys;

/// 按所在时区的本地时间将时间截断到分钟开始
/// Truncate an instant down to the start of its minute, in its own zone's wall-clock time
pub fn truncate_to_minute<Z: TimeZone>(instant: DateTime<Z>) -> DateTime<Z> {
  instant
    .clone()
    .duration_trunc(Duration::minutes(1))
    .unwrap_or(instant)
}

/// 使用固定格式格式化时间，偏移量取自时间所在的时区
/// Format an instant with the fixed enqueue time layout, using the offset of its zone
pub fn format_time<Z: TimeZone>(instant: DateTime<Z>) -> String
where
  Z::Offset: Display,
{
  instant.format(constants::TIME_LAYOUT).to_string()
}

/// 解析固定格式的时间，带偏移量的值会被转换为 UTC
/// Parse an instant in the fixed layout; offsets are normalized to UTC
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_str(value, constants::TIME_LAYOUT)
    .ok()
    .map(|t| t.with_timezone(&Utc))
}
