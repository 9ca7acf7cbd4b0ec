//! # 调度计算（Schedule）
//! # Schedule evaluation
//!
//! 包装五段式 cron 表达式（分 时 日 月 周），回答"给定时间之后的下一次调度时间"。
//! Wraps a five-field cron expression (minute hour day-of-month month day-of-week) and answers
//! "when is the next scheduled instant after this one".
//!
//! 表达式只在构造时解析一次；底层使用 `cron` crate，秒字段固定为 0。
//! 调度按所设时区的本地时间计算（默认 UTC），`0 9 * * *` 表示该时区的 09:00。
//! The expression is parsed once at construction; evaluation uses the `cron` crate with the
//! seconds field pinned to 0. Matching happens on the wall clock of the schedule's zone (UTC
//! unless set), so `0 9 * * *` means 09:00 in that zone.
//!
//! 与经典 cron 的差异在这里被抹平：
//! Differences from classic cron are smoothed over here:
//!   - 星期字段 0-7（0 和 7 都是周日）被映射到 `cron` crate 的 1-7（1 为周日）
//!     - day-of-week numerals 0-7 (0 and 7 are Sunday) are mapped onto the crate's 1-7 (1 is Sunday)
//!   - 日和星期同时受限时，任一匹配即可（OR 语义）
//!     - when both day-of-month and day-of-week are restricted, either one matching is enough

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::collections::BTreeSet;
use std::str::FromStr;

/// 解析后的五段式 cron 调度
/// A parsed five-field cron schedule
#[derive(Debug, Clone)]
pub struct CronSchedule {
  expression: String,
  /// 日/星期均受限时拆成两份调度，取最早者
  /// Split in two when both day fields are restricted; the earliest wins
  schedules: Vec<Schedule>,
  timezone: Tz,
}

impl CronSchedule {
  /// 解析五段式 cron 表达式
  /// Parse a five-field cron expression
  pub fn parse(expression: &str) -> Result<Self> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
      return Err(Error::invalid_expression(
        expression,
        format!("expected 5 fields, found {}", fields.len()),
      ));
    };

    let weekday = normalize_day_of_week(day_of_week)
      .map_err(|reason| Error::invalid_expression(expression, reason))?;

    let day_pairs = if is_unrestricted(day_of_month) || is_unrestricted(day_of_week) {
      vec![(day_of_month, weekday.as_str())]
    } else {
      vec![(day_of_month, "*"), ("*", weekday.as_str())]
    };

    let schedules = day_pairs
      .into_iter()
      .map(|(dom, dow)| {
        Schedule::from_str(&format!("0 {minute} {hour} {dom} {month} {dow}"))
          .map_err(|e| Error::invalid_expression(expression, e))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      expression: expression.to_string(),
      schedules,
      timezone: Tz::UTC,
    })
  }

  /// 设置计算调度所用的时区
  /// Set the zone whose wall clock the schedule is matched against
  pub fn with_timezone(mut self, timezone: Tz) -> Self {
    self.timezone = timezone;
    self
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  /// 原始表达式
  /// The original expression
  pub fn expression(&self) -> &str {
    &self.expression
  }

  /// 返回严格晚于 `instant` 的最早调度时间；若不存在则返回 None
  /// Returns the earliest scheduled instant strictly after `instant`, or None if there is none
  pub fn after(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let local = instant.with_timezone(&self.timezone);
    self
      .schedules
      .iter()
      .filter_map(|schedule| schedule.after(&local).next())
      .map(|next| next.with_timezone(&Utc))
      .min()
  }
}

impl FromStr for CronSchedule {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::parse(s)
  }
}

impl std::fmt::Display for CronSchedule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.expression)
  }
}

fn is_unrestricted(field: &str) -> bool {
  field == "*" || field == "?"
}

/// 将经典 cron 的星期数字（0-7，周日为 0 或 7）转换为 `cron` crate 的 1-7（周日为 1）。
/// 名称（MON、SUN-SAT 等）和 `*`、`*/n` 原样保留。
/// Converts classic day-of-week numerals (0-7, Sunday is 0 or 7) into the crate's 1-7 (Sunday
/// is 1). Names (MON, SUN-SAT, ...) and `*`, `*/n` pass through unchanged.
fn normalize_day_of_week(field: &str) -> std::result::Result<String, String> {
  if is_unrestricted(field) {
    return Ok(field.to_string());
  }

  let mut verbatim = Vec::new();
  let mut days = BTreeSet::new();
  for part in field.split(',') {
    if part.is_empty() {
      return Err("empty day-of-week list item".to_string());
    }
    // `*/n` 在 1-7 上与 0-6 上选中的是同样的星期
    // `*/n` selects the same weekdays over 1-7 as over 0-6
    if part.starts_with('*') || part.starts_with('?') || part.chars().any(|c| c.is_ascii_alphabetic())
    {
      verbatim.push(part.to_string());
      continue;
    }

    let (range, step) = match part.split_once('/') {
      Some((range, step)) => {
        let step = step
          .parse::<usize>()
          .map_err(|_| format!("invalid day-of-week step: {step}"))?;
        if step == 0 {
          return Err("day-of-week step must be positive".to_string());
        }
        (range, Some(step))
      }
      None => (part, None),
    };

    let (start, end) = match range.split_once('-') {
      Some((start, end)) => (parse_day(start)?, parse_day(end)?),
      None => {
        let day = parse_day(range)?;
        (day, if step.is_some() { 6 } else { day })
      }
    };
    if start > end {
      return Err(format!("invalid day-of-week range: {range}"));
    }

    for day in (start..=end).step_by(step.unwrap_or(1)) {
      days.insert(day % 7 + 1);
    }
  }

  verbatim.extend(days.iter().map(u32::to_string));
  Ok(verbatim.join(","))
}

fn parse_day(value: &str) -> std::result::Result<u32, String> {
  match value.parse::<u32>() {
    Ok(day) if day <= 7 => Ok(day),
    _ => Err(format!("invalid day of week: {value}")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, day, hour, min, 0).unwrap()
  }

  #[test]
  fn test_hourly_schedule() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    assert_eq!(schedule.after(at(2, 10, 59)), Some(at(2, 11, 0)));
    assert_eq!(schedule.after(at(2, 11, 0)), Some(at(2, 12, 0)));
    assert_eq!(schedule.expression(), "0 * * * *");
  }

  #[test]
  fn test_every_five_minutes() {
    let schedule: CronSchedule = "*/5 * * * *".parse().unwrap();
    assert_eq!(schedule.after(at(2, 11, 33)), Some(at(2, 11, 35)));
  }

  #[test]
  fn test_invalid_expressions() {
    for expression in ["", "* * * *", "* * * * * *", "61 * * * *", "* * * * 8", "* * * * 5-2"] {
      let err = CronSchedule::parse(expression).unwrap_err();
      assert!(
        matches!(err, Error::InvalidExpression { .. }),
        "expected InvalidExpression for {expression:?}, got {err:?}"
      );
    }
  }

  #[test]
  fn test_sunday_numerals() {
    // 2020-01-05 是周日
    // 2020-01-05 is a Sunday
    for expression in ["0 9 * * 0", "0 9 * * 7", "0 9 * * SUN"] {
      let schedule = CronSchedule::parse(expression).unwrap();
      assert_eq!(schedule.after(at(2, 0, 0)), Some(at(5, 9, 0)), "{expression}");
    }
  }

  #[test]
  fn test_weekday_range() {
    let schedule = CronSchedule::parse("0 9 * * 1-5").unwrap();
    // 周五 10:00 之后是周一 09:00
    // After Friday 10:00 comes Monday 09:00
    assert_eq!(schedule.after(at(3, 10, 0)), Some(at(6, 9, 0)));
  }

  #[test]
  fn test_normalize_day_of_week() {
    assert_eq!(normalize_day_of_week("*").unwrap(), "*");
    assert_eq!(normalize_day_of_week("0").unwrap(), "1");
    assert_eq!(normalize_day_of_week("7").unwrap(), "1");
    assert_eq!(normalize_day_of_week("1-5").unwrap(), "2,3,4,5,6");
    assert_eq!(normalize_day_of_week("0,6").unwrap(), "1,7");
    assert_eq!(normalize_day_of_week("1/2").unwrap(), "2,4,6");
    assert_eq!(normalize_day_of_week("MON-FRI").unwrap(), "MON-FRI");
    assert!(normalize_day_of_week("9").is_err());
    assert!(normalize_day_of_week("1,,2").is_err());
  }

  #[test]
  fn test_day_of_month_or_day_of_week() {
    // 每月 1 日或每周一的午夜
    // Midnight on the 1st of the month or on any Monday
    let schedule = CronSchedule::parse("0 0 1 * 1").unwrap();
    assert_eq!(schedule.after(at(2, 0, 0)), Some(at(6, 0, 0)));
    // 1 月 27 日是周一，下一个是 2 月 1 日（周六）
    // Jan 27 is a Monday; the next match is Feb 1 (a Saturday)
    assert_eq!(
      schedule.after(at(27, 0, 0)),
      Some(Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn test_schedule_in_zone() {
    let schedule = CronSchedule::parse("0 9 * * *")
      .unwrap()
      .with_timezone(chrono_tz::Europe::Paris);
    assert_eq!(schedule.timezone(), chrono_tz::Europe::Paris);
    // 冬令时 09:00 巴黎时间是 08:00 UTC
    // 09:00 in Paris during winter time is 08:00 UTC
    assert_eq!(schedule.after(at(2, 0, 0)), Some(at(2, 8, 0)));

    // 夏令时 09:00 巴黎时间是 07:00 UTC
    // 09:00 in Paris during summer time is 07:00 UTC
    let july = Utc.with_ymd_and_hms(2020, 7, 1, 0, 0, 0).unwrap();
    assert_eq!(
      schedule.after(july),
      Some(Utc.with_ymd_and_hms(2020, 7, 1, 7, 0, 0).unwrap())
    );
  }

  #[test]
  fn test_weekday_in_zone() {
    // 周日 23:30 UTC 在东京已经是周一
    // Sunday 23:30 UTC is already Monday in Tokyo
    let schedule = CronSchedule::parse("30 8 * * 1")
      .unwrap()
      .with_timezone(chrono_tz::Asia::Tokyo);
    assert_eq!(schedule.after(at(5, 0, 0)), Some(at(5, 23, 30)));
  }
}
