//! 轮询统计
//! Poller statistics
//!
//! 进程内计数器，只用于状态展示，与调度正确性无关。
//! In-process counters used for status reporting only; scheduling correctness never reads them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// 单次轮询的结果
/// Result of one poll tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
  /// 列出的条目数
  /// Entries listed
  pub entries: u64,
  /// 通过候选过滤的条目数
  /// Entries that passed the candidate filter
  pub due: u64,
  /// 成功入队数
  /// Jobs enqueued
  pub enqueued: u64,
  /// 认领失败（已被其他进程认领）数
  /// Claims lost to another process
  pub already_claimed: u64,
  /// 加载或入队出错的条目数
  /// Entries that failed to load or enqueue
  pub errors: u64,
  /// 因取消而未处理的条目数
  /// Entries left unprocessed because of cancellation
  pub skipped: u64,
}

/// 累计计数器
/// Cumulative counters
#[derive(Debug, Default)]
pub struct PollerStats {
  ticks: AtomicU64,
  failed_ticks: AtomicU64,
  entries: AtomicU64,
  due: AtomicU64,
  enqueued: AtomicU64,
  already_claimed: AtomicU64,
  errors: AtomicU64,
  last_tick_at: AtomicI64,
}

/// 计数器快照
/// Counter snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollerStatsSnapshot {
  pub ticks: u64,
  pub failed_ticks: u64,
  pub entries: u64,
  pub due: u64,
  pub enqueued: u64,
  pub already_claimed: u64,
  pub errors: u64,
  pub last_tick_at: Option<DateTime<Utc>>,
}

impl PollerStats {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_tick(&self, at: DateTime<Utc>, report: &TickReport) {
    self.ticks.fetch_add(1, Ordering::Relaxed);
    self.entries.fetch_add(report.entries, Ordering::Relaxed);
    self.due.fetch_add(report.due, Ordering::Relaxed);
    self.enqueued.fetch_add(report.enqueued, Ordering::Relaxed);
    self
      .already_claimed
      .fetch_add(report.already_claimed, Ordering::Relaxed);
    self.errors.fetch_add(report.errors, Ordering::Relaxed);
    self.last_tick_at.store(at.timestamp(), Ordering::Relaxed);
  }

  pub fn record_failed_tick(&self, at: DateTime<Utc>) {
    self.ticks.fetch_add(1, Ordering::Relaxed);
    self.failed_ticks.fetch_add(1, Ordering::Relaxed);
    self.last_tick_at.store(at.timestamp(), Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> PollerStatsSnapshot {
    let last = self.last_tick_at.load(Ordering::Relaxed);
    PollerStatsSnapshot {
      ticks: self.ticks.load(Ordering::Relaxed),
      failed_ticks: self.failed_ticks.load(Ordering::Relaxed),
      entries: self.entries.load(Ordering::Relaxed),
      due: self.due.load(Ordering::Relaxed),
      enqueued: self.enqueued.load(Ordering::Relaxed),
      already_claimed: self.already_claimed.load(Ordering::Relaxed),
      errors: self.errors.load(Ordering::Relaxed),
      last_tick_at: (last > 0)
        .then(|| DateTime::from_timestamp(last, 0))
        .flatten(),
    }
  }
}

impl std::ops::AddAssign<&PollerStatsSnapshot> for PollerStatsSnapshot {
  fn add_assign(&mut self, other: &PollerStatsSnapshot) {
    self.ticks += other.ticks;
    self.failed_ticks += other.failed_ticks;
    self.entries += other.entries;
    self.due += other.due;
    self.enqueued += other.enqueued;
    self.already_claimed += other.already_claimed;
    self.errors += other.errors;
    self.last_tick_at = self.last_tick_at.max(other.last_tick_at);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_record_and_snapshot() {
    let stats = PollerStats::new();
    assert_eq!(stats.snapshot(), PollerStatsSnapshot::default());

    let at = Utc.with_ymd_and_hms(2020, 1, 2, 11, 0, 0).unwrap();
    stats.record_tick(
      at,
      &TickReport {
        entries: 3,
        due: 2,
        enqueued: 1,
        already_claimed: 1,
        ..Default::default()
      },
    );
    stats.record_failed_tick(at);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.ticks, 2);
    assert_eq!(snapshot.failed_ticks, 1);
    assert_eq!(snapshot.entries, 3);
    assert_eq!(snapshot.enqueued, 1);
    assert_eq!(snapshot.last_tick_at, Some(at));

    let mut total = PollerStatsSnapshot::default();
    total += &snapshot;
    total += &snapshot;
    assert_eq!(total.enqueued, 2);
    assert_eq!(total.last_tick_at, Some(at));
  }
}
