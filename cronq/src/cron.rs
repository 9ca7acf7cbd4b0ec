//! # 每周期只入队一次（Cron）
//! # Enqueue once per period
//!
//! 多个调度进程共享同一个存储时，靠 `ZADD NX` 的返回值仲裁：第一个写入某条目某周期认领成员的调用者
//! 拿到 1 并获得入队权，其余调用者拿到 0 并放弃。没有分布式锁，也没有选主。
//! When several scheduler processes share one store, the reply of `ZADD NX` arbitrates: the
//! first caller to write the claim member for an entry's period gets 1 and the right to
//! enqueue; every other caller gets 0 and backs off. There is no distributed lock and no
//! leader election.
//!
//! 入队失败时认领不会回滚，该周期被视为已处理，下一次机会是下一个调度周期。
//! A failed enqueue does not roll the claim back; the period counts as handled and the next
//! chance is the next scheduled period.
//!
//! 认领集合和历史列表都有上限：赢得认领后清理保留期之前的认领成员，历史只保留最近若干条。
//! 共享同一存储的进程必须使用相同的时区，认领成员带有该时区的偏移量。
//! Claim sets and history lists are bounded: claim members older than the retention window are
//! pruned after a claim is won, and only the most recent history records are kept. Processes
//! sharing one store must use the same zone, since claim members carry its offset.

use crate::base::constants::{DEFAULT_CLAIM_RETENTION, DEFAULT_HISTORY_SIZE};
use crate::base::{format_time, keys, truncate_to_minute};
use crate::entry::CronEntry;
use crate::error::{Error, Result};
use crate::queue::JobQueue;
use crate::store::CronStore;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// `enqueue_once` 的结果
/// Outcome of `enqueue_once`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
  /// 赢得认领并成功入队
  /// Won the claim and enqueued the job
  Enqueued { jid: String },
  /// 本周期已被其他调用者认领
  /// Another caller already claimed this period
  AlreadyClaimed,
}

/// 入队历史记录
/// Enqueue history record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
  pub jid: String,
  pub enqueued: String,
}

/// 条目注册与入队
/// Entry registration and enqueueing
pub struct Cron {
  store: Arc<dyn CronStore>,
  queue: Arc<dyn JobQueue>,
  timezone: Tz,
  history_size: usize,
  claim_retention: Duration,
}

impl Cron {
  pub fn new(store: Arc<dyn CronStore>, queue: Arc<dyn JobQueue>) -> Self {
    Self {
      store,
      queue,
      timezone: Tz::UTC,
      history_size: DEFAULT_HISTORY_SIZE,
      claim_retention: DEFAULT_CLAIM_RETENTION,
    }
  }

  /// 设置加载条目时使用的调度时区
  /// Set the schedule zone applied to loaded entries
  pub fn with_timezone(mut self, timezone: Tz) -> Self {
    self.timezone = timezone;
    self
  }

  /// 设置每个条目保留的历史条数，至少为 1
  /// Set how many history records are kept per entry, at least 1
  pub fn with_history_size(mut self, history_size: usize) -> Self {
    self.history_size = history_size.max(1);
    self
  }

  /// 设置认领成员的保留时长，至少一分钟
  /// Set how long claim members are kept, at least one minute
  pub fn with_claim_retention(mut self, retention: Duration) -> Self {
    self.claim_retention = retention.max(Duration::from_secs(60));
    self
  }

  pub fn timezone(&self) -> Tz {
    self.timezone
  }

  pub fn store(&self) -> &Arc<dyn CronStore> {
    &self.store
  }

  /// 注册或覆盖一个条目
  /// Register or overwrite an entry
  pub async fn add_cron(&self, entry: &CronEntry) -> Result<()> {
    let key = entry.cron_job_key();
    let fields: Vec<(String, String)> = entry.to_record()?.into_iter().collect();
    self.store.sadd(keys::ALL_CRON_JOBS, &key).await?;
    self.store.hset_multiple(&key, &fields).await?;
    tracing::info!(entry = entry.name(), cron = entry.expression(), "registered cron entry");
    Ok(())
  }

  /// 移除条目及其认领和历史
  /// Remove an entry together with its claims and history
  pub async fn remove_cron(&self, name: &str) -> Result<()> {
    let key = keys::cron_job_key(name);
    self.store.srem(keys::ALL_CRON_JOBS, &key).await?;
    self
      .store
      .del(&[key, keys::enqueued_key(name), keys::jid_history_key(name)])
      .await?;
    tracing::info!(entry = name, "removed cron entry");
    Ok(())
  }

  /// 列出所有已注册条目的记录键
  /// List the record keys of every registered entry
  pub async fn cron_entry_keys(&self) -> Result<Vec<String>> {
    self.store.smembers(keys::ALL_CRON_JOBS).await
  }

  /// 按记录键加载一个条目
  /// Load one entry by its record key
  pub async fn load_entry(&self, key: &str) -> Result<CronEntry> {
    let record = self.store.hgetall(key).await?;
    Ok(CronEntry::from_record(&record)?.with_timezone(self.timezone))
  }

  /// 加载所有条目，跳过无法解析的记录；列出键失败时返回错误
  /// Load every entry, skipping records that fail to decode; fails only if listing fails
  pub async fn cron_entries(&self) -> Result<Vec<CronEntry>> {
    let mut entries = Vec::new();
    for key in self.cron_entry_keys().await? {
      match self.load_entry(&key).await {
        Ok(entry) => entries.push(entry),
        Err(e) if e.is_entry_error() => {
          tracing::warn!(key = %key, error = %e, "skipping malformed cron entry");
        }
        Err(e) => return Err(e),
      }
    }
    Ok(entries)
  }

  /// 读取条目最近的入队历史，最新的在前
  /// Read the most recent enqueue history of an entry, newest first
  pub async fn history(&self, name: &str, limit: usize) -> Result<Vec<HistoryRecord>> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
    self
      .store
      .lrange(&keys::jid_history_key(name), 0, stop)
      .await?
      .iter()
      .map(|raw| serde_json::from_str(raw).map_err(Error::from))
      .collect()
  }

  /// 每个调度周期最多入队一次。`ZADD NX` 的原子性保证多进程下的安全。
  /// Enqueue at most once per scheduled period. The atomicity of `ZADD NX` keeps this safe
  /// across processes.
  pub async fn enqueue_once(
    &self,
    entry: &CronEntry,
    for_time: DateTime<Utc>,
  ) -> Result<EnqueueOutcome> {
    let tz = entry.timezone();
    let period = truncate_to_minute(for_time.with_timezone(&tz));
    let score = period.timestamp() as f64;
    let member = format_time(
      entry
        .next(for_time)
        .map(|next| next.with_timezone(&tz))
        .unwrap_or(period),
    );

    let added = self
      .store
      .zadd_nx(&entry.enqueued_key(), &member, score)
      .await?;
    if added != 1 {
      tracing::debug!(entry = entry.name(), period = %member, "period already claimed");
      return Ok(EnqueueOutcome::AlreadyClaimed);
    }

    // 只有当前周期参与去重，更早的成员可以清理
    // Only the current period takes part in dedup, older members can go
    let cutoff = score - self.claim_retention.as_secs() as f64;
    if let Err(e) = self
      .store
      .zremrangebyscore(&entry.enqueued_key(), f64::NEG_INFINITY, cutoff - 1.0)
      .await
    {
      tracing::warn!(entry = entry.name(), error = %e, "failed to prune old claims");
    }

    let jid = self.enqueue(entry, for_time).await?;
    Ok(EnqueueOutcome::Enqueued { jid })
  }

  /// 直接入队并记录最近入队时间与历史，不做认领。
  /// 入队成功后的记录写入失败只会记录警告：认领集合才是去重依据。
  /// Enqueue directly and record the last enqueue time and history, without claiming.
  /// Bookkeeping failures after a successful enqueue are only logged: the claim set is what
  /// deduplicates.
  pub async fn enqueue(&self, entry: &CronEntry, for_time: DateTime<Utc>) -> Result<String> {
    let job = &entry.job;
    let jid = self
      .queue
      .enqueue(&job.queue, &job.class, &job.args, &job.retry)
      .await
      .map_err(|e| match e {
        e @ Error::DownstreamEnqueueFailed { .. } => e,
        other => Error::downstream(&job.queue, &job.class, other),
      })?;

    let enqueued = format_time(for_time.with_timezone(&entry.timezone()));
    tracing::info!(entry = entry.name(), jid = %jid, queue = %job.queue, enqueued = %enqueued, "enqueued cron job");

    if let Err(e) = self.record_enqueue(entry, &jid, &enqueued).await {
      tracing::warn!(entry = entry.name(), jid = %jid, error = %e, "failed to record enqueue bookkeeping");
    }
    Ok(jid)
  }

  async fn record_enqueue(&self, entry: &CronEntry, jid: &str, enqueued: &str) -> Result<()> {
    self
      .store
      .hset_multiple(
        &entry.cron_job_key(),
        &[(
          crate::record::FIELD_LAST_ENQUEUE_TIME.to_string(),
          enqueued.to_string(),
        )],
      )
      .await?;
    let history = serde_json::to_string(&HistoryRecord {
      jid: jid.to_string(),
      enqueued: enqueued.to_string(),
    })?;
    let history_key = entry.jid_history_key();
    self.store.lpush(&history_key, &history).await?;
    let stop = isize::try_from(self.history_size).unwrap_or(isize::MAX) - 1;
    self.store.ltrim(&history_key, 0, stop).await
  }
}
