//! Poller 模块
//! Poller module
//!
//! 调度主循环：每个周期列出所有条目，逐个判断是否到期，并对候选条目执行"每周期只入队一次"协议。
//! The scheduling loop: on every tick it lists all entries, checks each for due-ness and runs
//! the enqueue-once protocol for every candidate.
//!
//! 状态：Idle → Ticking → Idle，取消后进入终止状态。单个条目的错误只影响该条目；列出条目失败只放弃本次轮询。
//! States: Idle → Ticking → Idle, with a terminal state after cancellation. A failing entry only
//! affects itself; failing to list entries only abandons the current tick.

use crate::components::ComponentLifecycle;
use crate::config::PollerConfig;
use crate::cron::{Cron, EnqueueOutcome};
use crate::error::{Error, Result};
use crate::stats::{PollerStats, TickReport};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 单个条目在一次轮询中的处理结果
/// What happened to one entry during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryOutcome {
  NotDue,
  Enqueued,
  AlreadyClaimed,
  LoadFailed,
  EnqueueFailed,
  Cancelled,
}

/// 轮询器
/// Poller
pub struct Poller {
  id: String,
  cron: Arc<Cron>,
  config: PollerConfig,
  stats: Arc<PollerStats>,
  token: CancellationToken,
}

impl Poller {
  /// 创建轮询器，自动生成 id（主机名:进程号:uuid）
  /// Create a poller with a generated id (hostname:pid:uuid)
  pub fn new(cron: Arc<Cron>, config: PollerConfig) -> Self {
    let id = format!(
      "{}:{}:{}",
      hostname::get().unwrap_or_default().to_string_lossy(),
      std::process::id(),
      Uuid::new_v4()
    );
    Self {
      id,
      cron,
      config,
      stats: Arc::new(PollerStats::new()),
      token: CancellationToken::new(),
    }
  }

  /// 使用外部提供的取消令牌
  /// Use an externally supplied cancellation token
  pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
    self.token = token;
    self
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn config(&self) -> &PollerConfig {
    &self.config
  }

  pub fn stats(&self) -> Arc<PollerStats> {
    self.stats.clone()
  }

  pub fn cancellation_token(&self) -> CancellationToken {
    self.token.clone()
  }

  /// 启动轮询循环
  /// Start the polling loop
  pub fn start(self: Arc<Self>) -> JoinHandle<()> {
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(self.config.poll_interval);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      tracing::info!(poller = %self.id, interval = ?self.config.poll_interval, "Poller: started");
      loop {
        tokio::select! {
          _ = self.token.cancelled() => break,
          _ = interval.tick() => {}
        }

        match self.poll(Utc::now()).await {
          Ok(report) => {
            tracing::debug!(
              entries = report.entries,
              due = report.due,
              enqueued = report.enqueued,
              already_claimed = report.already_claimed,
              errors = report.errors,
              "Poller: tick complete"
            );
          }
          Err(Error::Cancelled) => break,
          Err(e) => tracing::error!("Poller tick failed: {}", e),
        }
      }
      tracing::debug!(poller = %self.id, "Poller: shutting down");
    })
  }

  /// 以 `for_time` 为准执行一次轮询
  /// Run one tick evaluated at `for_time`
  pub async fn poll(&self, for_time: DateTime<Utc>) -> Result<TickReport> {
    if self.token.is_cancelled() {
      return Err(Error::Cancelled);
    }

    let keys = match self.cron.cron_entry_keys().await {
      Ok(keys) => keys,
      Err(e) => {
        self.stats.record_failed_tick(for_time);
        return Err(e);
      }
    };

    let mut report = TickReport {
      entries: keys.len() as u64,
      ..Default::default()
    };
    let outcomes: Vec<EntryOutcome> = stream::iter(keys)
      .map(|key| self.process_entry(key, for_time))
      .buffer_unordered(self.config.max_concurrent_entries.max(1))
      .collect()
      .await;

    for outcome in outcomes {
      match outcome {
        EntryOutcome::NotDue => {}
        EntryOutcome::Enqueued => {
          report.due += 1;
          report.enqueued += 1;
        }
        EntryOutcome::AlreadyClaimed => {
          report.due += 1;
          report.already_claimed += 1;
        }
        EntryOutcome::LoadFailed => report.errors += 1,
        EntryOutcome::EnqueueFailed => {
          report.due += 1;
          report.errors += 1;
        }
        EntryOutcome::Cancelled => report.skipped += 1,
      }
    }

    self.stats.record_tick(for_time, &report);
    Ok(report)
  }

  async fn process_entry(&self, key: String, for_time: DateTime<Utc>) -> EntryOutcome {
    if self.token.is_cancelled() {
      return EntryOutcome::Cancelled;
    }

    let entry = match self.cron.load_entry(&key).await {
      Ok(entry) => entry,
      Err(e) => {
        tracing::warn!(key = %key, error = %e, "Poller: failed to load cron entry");
        return EntryOutcome::LoadFailed;
      }
    };

    if !entry.should_enqueue(for_time) {
      return EntryOutcome::NotDue;
    }

    match self.cron.enqueue_once(&entry, for_time).await {
      Ok(EnqueueOutcome::Enqueued { .. }) => EntryOutcome::Enqueued,
      Ok(EnqueueOutcome::AlreadyClaimed) => EntryOutcome::AlreadyClaimed,
      Err(e) => {
        tracing::warn!(entry = entry.name(), error = %e, "Poller: failed to enqueue cron entry");
        EntryOutcome::EnqueueFailed
      }
    }
  }

  /// 请求停止轮询循环
  /// Request the polling loop to stop
  pub fn shutdown(&self) {
    self.token.cancel();
  }

  pub fn is_done(&self) -> bool {
    self.token.is_cancelled()
  }
}

impl ComponentLifecycle for Poller {
  fn start(self: Arc<Self>) -> JoinHandle<()> {
    Poller::start(self)
  }

  fn shutdown(&self) {
    Poller::shutdown(self)
  }

  fn is_done(&self) -> bool {
    Poller::is_done(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entry::{CronEntry, EntryStatus, Job};
  use crate::store::{CronStore, MemoryStore};
  use crate::testing::{CountingQueue, FaultyStore};
  use chrono::TimeZone;
  use std::sync::atomic::Ordering;
  use std::time::Duration;

  fn unreachable_store() -> Arc<FaultyStore> {
    let store = FaultyStore::default();
    store.fail_listing.store(true, Ordering::SeqCst);
    Arc::new(store)
  }

  fn at_time(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 2, hour, min, sec).unwrap()
  }

  fn entry(name: &str, cron: &str, status: EntryStatus) -> CronEntry {
    CronEntry::new(name, cron, status, Job::new("default", "HourlyWorker")).unwrap()
  }

  async fn setup() -> (MemoryStore, Arc<CountingQueue>, Arc<Cron>) {
    let store = MemoryStore::new();
    let queue = Arc::new(CountingQueue::default());
    let cron = Arc::new(Cron::new(Arc::new(store.clone()), queue.clone()));
    cron
      .add_cron(&entry("hourly", "0 * * * *", EntryStatus::Enabled))
      .await
      .unwrap();
    cron
      .add_cron(&entry("hourly off", "0 * * * *", EntryStatus::Disabled))
      .await
      .unwrap();
    cron
      .add_cron(&entry("half past", "30 * * * *", EntryStatus::Enabled))
      .await
      .unwrap();
    (store, queue, cron)
  }

  #[tokio::test]
  async fn test_poll_enqueues_due_entries() {
    let (_, queue, cron) = setup().await;
    let poller = Poller::new(cron, PollerConfig::default());

    let report = poller.poll(at_time(11, 0, 10)).await.unwrap();
    assert_eq!(
      report,
      TickReport {
        entries: 3,
        due: 1,
        enqueued: 1,
        ..Default::default()
      }
    );
    assert_eq!(queue.calls(), 1);

    // 同一分钟再次轮询：最近入队时间已持久化，不再是候选
    // Polling again in the same minute: the last enqueue time is persisted, nothing is due
    let report = poller.poll(at_time(11, 0, 40)).await.unwrap();
    assert_eq!(report.due, 0);
    assert_eq!(queue.calls(), 1);

    let report = poller.poll(at_time(11, 30, 0)).await.unwrap();
    assert_eq!(report.enqueued, 1);

    let snapshot = poller.stats().snapshot();
    assert_eq!(snapshot.ticks, 3);
    assert_eq!(snapshot.enqueued, 2);
  }

  #[tokio::test]
  async fn test_malformed_entry_does_not_abort_tick() {
    let (store, queue, cron) = setup().await;
    store.sadd("cron_jobs", "cron_job:broken").await.unwrap();
    store
      .hset_multiple(
        "cron_job:broken",
        &[("name".to_string(), "broken".to_string())],
      )
      .await
      .unwrap();

    let poller = Poller::new(cron, PollerConfig::default().max_concurrent_entries(4));
    let report = poller.poll(at_time(12, 0, 0)).await.unwrap();
    assert_eq!(report.entries, 4);
    assert_eq!(report.errors, 1);
    assert_eq!(report.enqueued, 1);
    assert_eq!(queue.calls(), 1);
  }

  #[tokio::test]
  async fn test_competing_pollers_enqueue_once() {
    let (_, queue, cron) = setup().await;
    let store = cron.store().clone();

    let pollers: Vec<Poller> = (0..4)
      .map(|_| {
        let cron = Arc::new(Cron::new(store.clone(), queue.clone()));
        Poller::new(cron, PollerConfig::default())
      })
      .collect();

    let reports = futures::future::join_all(pollers.iter().map(|p| p.poll(at_time(11, 0, 0)))).await;
    let enqueued: u64 = reports.into_iter().map(|r| r.unwrap().enqueued).sum();
    assert_eq!(enqueued, 1);
    assert_eq!(queue.calls(), 1);
  }

  #[tokio::test]
  async fn test_listing_failure_fails_only_the_tick() {
    let cron = Arc::new(Cron::new(
      unreachable_store(),
      Arc::new(CountingQueue::default()),
    ));
    let poller = Poller::new(cron, PollerConfig::default());

    let err = poller.poll(at_time(11, 0, 0)).await.unwrap_err();
    assert!(err.is_store_error());
    let snapshot = poller.stats().snapshot();
    assert_eq!(snapshot.failed_ticks, 1);
  }

  #[tokio::test]
  async fn test_claim_failure_counts_as_entry_error() {
    let store = Arc::new(FaultyStore::default());
    let queue = Arc::new(CountingQueue::default());
    let cron = Arc::new(Cron::new(store.clone(), queue.clone()));
    cron
      .add_cron(&entry("hourly", "0 * * * *", EntryStatus::Enabled))
      .await
      .unwrap();
    store.fail_claim.store(true, Ordering::SeqCst);

    let poller = Poller::new(cron, PollerConfig::default());
    let report = poller.poll(at_time(11, 0, 0)).await.unwrap();
    assert_eq!(
      report,
      TickReport {
        entries: 1,
        due: 1,
        errors: 1,
        ..Default::default()
      }
    );
    assert_eq!(queue.calls(), 0);
    assert_eq!(poller.stats().snapshot().errors, 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_loop_survives_store_outage_and_stops_on_cancel() {
    let cron = Arc::new(Cron::new(
      unreachable_store(),
      Arc::new(CountingQueue::default()),
    ));
    let config = PollerConfig::new()
      .poll_interval(Duration::from_millis(100))
      .unwrap();
    let poller = Arc::new(Poller::new(cron, config));

    let handle = poller.clone().start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(poller.stats().snapshot().failed_ticks >= 2);
    assert!(!handle.is_finished());

    poller.shutdown();
    handle.await.unwrap();
    assert!(poller.is_done());
    assert!(matches!(
      poller.poll(at_time(11, 0, 0)).await,
      Err(Error::Cancelled)
    ));
  }

  #[tokio::test]
  async fn test_external_token_cancels_loop() {
    let (_, _, cron) = setup().await;
    let token = CancellationToken::new();
    let poller =
      Arc::new(Poller::new(cron, PollerConfig::default()).with_cancellation_token(token.clone()));

    let handle = ComponentLifecycle::start(poller.clone());
    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
      .await
      .unwrap()
      .unwrap();
    assert!(ComponentLifecycle::is_done(poller.as_ref()));
  }
}
