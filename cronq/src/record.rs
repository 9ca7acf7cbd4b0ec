//! 条目与存储记录之间的映射
//! Mapping between entries and their stored records
//!
//! 记录是一个扁平的字符串哈希，字段名与 Ruby sidekiq-cron 写入的哈希一致。
//! A record is a flat string hash whose field names match what Ruby sidekiq-cron writes.

use crate::base::{format_time, parse_time};
use crate::entry::{CronEntry, EntryStatus, Job};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_CRON: &str = "cron";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_ACTIVE_JOB: &str = "active_job";
pub const FIELD_QUEUE_NAME_PREFIX: &str = "queue_name_prefix";
pub const FIELD_QUEUE_NAME_DELIMITER: &str = "queue_name_delimiter";
pub const FIELD_ARGS: &str = "args";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_LAST_ENQUEUE_TIME: &str = "last_enqueue_time";
/// 仅为兼容写入，读取时可选
/// Written for compatibility only, optional on read
pub const FIELD_KLASS: &str = "klass";

/// 读取记录时必须存在的字段
/// Fields that must be present when reading a record
pub const REQUIRED_FIELDS: [&str; 10] = [
  FIELD_NAME,
  FIELD_DESCRIPTION,
  FIELD_CRON,
  FIELD_STATUS,
  FIELD_ACTIVE_JOB,
  FIELD_QUEUE_NAME_PREFIX,
  FIELD_QUEUE_NAME_DELIMITER,
  FIELD_ARGS,
  FIELD_MESSAGE,
  FIELD_LAST_ENQUEUE_TIME,
];

/// 扁平记录
/// Flat record
pub type Record = HashMap<String, String>;

impl CronEntry {
  /// 转换为存储记录。args 总是编码为数组（Ruby 端要求）。
  /// Convert to a stored record. Args are always encoded as an array, as Ruby consumers expect.
  pub fn to_record(&self) -> Result<Record> {
    let args = serde_json::to_string(&self.args)?;
    let message = serde_json::to_string(&self.job)?;

    let fields = [
      (FIELD_NAME, self.name.clone()),
      (FIELD_DESCRIPTION, self.description.clone()),
      (FIELD_CRON, self.expression().to_string()),
      (FIELD_STATUS, self.status.as_str().to_string()),
      (FIELD_ACTIVE_JOB, self.active_job.to_string()),
      (FIELD_QUEUE_NAME_PREFIX, self.queue_name_prefix.clone()),
      (FIELD_QUEUE_NAME_DELIMITER, self.queue_name_delimiter.clone()),
      (FIELD_ARGS, args),
      (FIELD_MESSAGE, message),
      (
        FIELD_LAST_ENQUEUE_TIME,
        self
          .last_enqueue_time
          .map(|t| format_time(t.with_timezone(&self.timezone())))
          .unwrap_or_default(),
      ),
      (FIELD_KLASS, self.job.class.clone()),
    ];

    Ok(
      fields
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .collect(),
    )
  }

  /// 从存储记录重建条目，调度时区为 UTC，可再用 [`CronEntry::with_timezone`] 修改
  /// Rebuild an entry from a stored record. The schedule zone is UTC; use
  /// [`CronEntry::with_timezone`] to change it
  pub fn from_record(record: &Record) -> Result<Self> {
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !record.contains_key(**f)) {
      return Err(Error::MissingField { field: *field });
    }
    let field = |name: &'static str| record.get(name).map(String::as_str).unwrap_or_default();

    let args: Option<Vec<Value>> =
      serde_json::from_str(field(FIELD_ARGS)).map_err(|source| Error::InvalidEncoding {
        field: FIELD_ARGS,
        source,
      })?;
    let job: Job =
      serde_json::from_str(field(FIELD_MESSAGE)).map_err(|source| Error::InvalidEncoding {
        field: FIELD_MESSAGE,
        source,
      })?;

    let last_enqueue_time = match field(FIELD_LAST_ENQUEUE_TIME) {
      "" => None,
      value => Some(parse_time(value).ok_or_else(|| Error::InvalidTimeFormat {
        value: value.to_string(),
      })?),
    };

    // 未知状态按禁用处理，只有 enabled 会被调度
    // Unknown statuses load as disabled; only `enabled` is ever scheduled
    let status = field(FIELD_STATUS)
      .parse::<EntryStatus>()
      .unwrap_or(EntryStatus::Disabled);

    let mut entry = CronEntry::new(field(FIELD_NAME), field(FIELD_CRON), status, job)?
      .with_description(field(FIELD_DESCRIPTION))
      .with_active_job(field(FIELD_ACTIVE_JOB) == "true")
      .with_queue_name_prefix(field(FIELD_QUEUE_NAME_PREFIX))
      .with_queue_name_delimiter(field(FIELD_QUEUE_NAME_DELIMITER))
      .with_args(args.unwrap_or_default());
    entry.last_enqueue_time = last_enqueue_time;
    Ok(entry)
  }
}
