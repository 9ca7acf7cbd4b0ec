//! # 定时条目（CronEntry）
//! # Cron entries
//!
//! 一个条目是一个具名的周期性任务定义：调度表达式、启用状态、下游任务描述以及最近一次入队时间。
//! An entry is a named recurring job definition: its schedule, enablement status, the downstream
//! job descriptor and the time it was last enqueued.
//!
//! `should_enqueue` 只是候选过滤器；真正保证每个周期只入队一次的是 [`crate::cron::Cron::enqueue_once`]。
//! `should_enqueue` is only a candidate filter; the once-per-period guarantee comes from
//! [`crate::cron::Cron::enqueue_once`].

use crate::base::constants::{DEFAULT_QUEUE_NAME, STATUS_DISABLED, STATUS_ENABLED};
use crate::base::{keys, truncate_to_minute};
use crate::error::{Error, Result};
use crate::schedule::CronSchedule;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// 条目状态
/// Entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
  #[default]
  Enabled,
  Disabled,
}

impl EntryStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Enabled => STATUS_ENABLED,
      Self::Disabled => STATUS_DISABLED,
    }
  }
}

impl FromStr for EntryStatus {
  type Err = ();

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      STATUS_ENABLED => Ok(Self::Enabled),
      STATUS_DISABLED => Ok(Self::Disabled),
      _ => Err(()),
    }
  }
}

impl std::fmt::Display for EntryStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 重试策略，原样传递给下游
/// Retry policy, passed through to the downstream queue untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetryPolicy {
  Flag(bool),
  Attempts(u32),
  Text(String),
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::Flag(true)
  }
}

/// 下游任务描述
/// Downstream job descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  #[serde(default)]
  pub retry: RetryPolicy,
  pub queue: String,
  pub class: String,
  /// 发送给任务队列的参数，缺失或 null 时为空数组
  /// Arguments sent to the job queue; empty when absent or null
  #[serde(default, deserialize_with = "deserialize_args")]
  pub args: Vec<Value>,
}

impl Job {
  pub fn new<Q: Into<String>, C: Into<String>>(queue: Q, class: C) -> Self {
    Self {
      retry: RetryPolicy::default(),
      queue: queue.into(),
      class: class.into(),
      args: Vec::new(),
    }
  }

  pub fn with_args(mut self, args: Vec<Value>) -> Self {
    self.args = args;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }
}

impl Default for Job {
  fn default() -> Self {
    Self::new(DEFAULT_QUEUE_NAME, "")
  }
}

/// 将 JSON null 视为空数组
/// Treats a JSON null as an empty array
pub(crate) fn deserialize_args<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 定时条目
/// Cron entry
#[derive(Debug, Clone)]
pub struct CronEntry {
  pub(crate) name: String,
  pub(crate) schedule: CronSchedule,
  pub description: String,
  pub status: EntryStatus,
  pub active_job: bool,
  pub queue_name_prefix: String,
  pub queue_name_delimiter: String,
  pub args: Vec<Value>,
  pub job: Job,
  pub last_enqueue_time: Option<DateTime<Utc>>,
}

impl CronEntry {
  /// 创建新条目，立即解析 cron 表达式
  /// Create a new entry, parsing the cron expression up front
  pub fn new<N: Into<String>>(name: N, expression: &str, status: EntryStatus, job: Job) -> Result<Self> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(Error::InvalidName { name });
    }
    Ok(Self {
      name,
      schedule: CronSchedule::parse(expression)?,
      description: String::new(),
      status,
      active_job: false,
      queue_name_prefix: String::new(),
      queue_name_delimiter: String::new(),
      args: Vec::new(),
      job,
      last_enqueue_time: None,
    })
  }

  pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
    self.description = description.into();
    self
  }

  pub fn with_args(mut self, args: Vec<Value>) -> Self {
    self.args = args;
    self
  }

  pub fn with_queue_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
    self.queue_name_prefix = prefix.into();
    self
  }

  pub fn with_queue_name_delimiter<S: Into<String>>(mut self, delimiter: S) -> Self {
    self.queue_name_delimiter = delimiter.into();
    self
  }

  pub fn with_active_job(mut self, active_job: bool) -> Self {
    self.active_job = active_job;
    self
  }

  /// 设置调度时区；时区不写入记录，由加载方决定
  /// Set the schedule zone; it is not part of the record and is chosen by whoever loads it
  pub fn with_timezone(mut self, timezone: Tz) -> Self {
    self.schedule = self.schedule.with_timezone(timezone);
    self
  }

  pub fn with_last_enqueue_time(mut self, last_enqueue_time: DateTime<Utc>) -> Self {
    self.last_enqueue_time = Some(last_enqueue_time);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn expression(&self) -> &str {
    self.schedule.expression()
  }

  pub fn schedule(&self) -> &CronSchedule {
    &self.schedule
  }

  pub fn timezone(&self) -> Tz {
    self.schedule.timezone()
  }

  pub fn is_enabled(&self) -> bool {
    self.status == EntryStatus::Enabled
  }

  /// 条目记录键
  /// Entry record key
  pub fn cron_job_key(&self) -> String {
    keys::cron_job_key(&self.name)
  }

  /// 认领集合键
  /// Claim set key
  pub fn enqueued_key(&self) -> String {
    keys::enqueued_key(&self.name)
  }

  /// 任务 ID 历史键
  /// Job id history key
  pub fn jid_history_key(&self) -> String {
    keys::jid_history_key(&self.name)
  }

  /// 返回 `now` 所在分钟或之后的最早调度时间。
  /// 先回退一分钟再求"下一次"，这样当前分钟本身若匹配也会被返回。
  /// Returns the earliest scheduled instant at or after the minute containing `now`.
  /// Stepping back one minute before asking for the next occurrence lets the current minute
  /// itself be returned when it matches.
  pub fn next(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let minute = truncate_to_minute(now.with_timezone(&self.timezone()));
    self
      .schedule
      .after((minute - Duration::minutes(1)).with_timezone(&Utc))
  }

  /// 条目已启用、当前分钟是调度时间且本周期尚未入队时返回 true。
  /// 多个进程可能同时通过此检查，入队逻辑必须再次确认。
  /// Returns true if the entry is enabled, the current minute is a scheduled occurrence and
  /// this period has not been enqueued yet. Several processes may pass this check at once, so
  /// the enqueue path must arbitrate again.
  pub fn should_enqueue(&self, now: DateTime<Utc>) -> bool {
    if !self.is_enabled() {
      return false;
    }

    let now = truncate_to_minute(now.with_timezone(&self.timezone())).with_timezone(&Utc);
    if self.next(now) != Some(now) {
      return false;
    }

    match self.last_enqueue_time {
      None => true,
      Some(last) => last < now,
    }
  }
}

/// 可反序列化的条目定义，用于从调度文件批量注册
/// Deserializable entry definition, used to register entries in bulk from a schedule file
#[derive(Debug, Clone, Deserialize)]
pub struct EntryDefinition {
  pub name: String,
  pub cron: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status: EntryStatus,
  #[serde(default)]
  pub queue_name_prefix: String,
  #[serde(default)]
  pub queue_name_delimiter: String,
  #[serde(default, deserialize_with = "deserialize_args")]
  pub args: Vec<Value>,
  pub job: Job,
}

impl TryFrom<EntryDefinition> for CronEntry {
  type Error = Error;

  fn try_from(def: EntryDefinition) -> Result<Self> {
    Ok(
      CronEntry::new(def.name, &def.cron, def.status, def.job)?
        .with_description(def.description)
        .with_queue_name_prefix(def.queue_name_prefix)
        .with_queue_name_delimiter(def.queue_name_delimiter)
        .with_args(def.args),
    )
  }
}
