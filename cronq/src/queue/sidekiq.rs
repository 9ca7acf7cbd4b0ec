//! Sidekiq 兼容的任务生产者
//! Sidekiq-compatible job producer
//!
//! 按 Sidekiq 客户端的方式入队：把任务 JSON 推入 `queue:<name>` 列表，并把队列名登记到 `queues` 集合。
//! Enqueues the way the Sidekiq client does: pushes the job JSON onto the `queue:<name>` list and
//! registers the queue name in the `queues` set.

use super::JobQueue;
use crate::base::keys;
use crate::entry::RetryPolicy;
use crate::error::{Error, Result};
use crate::store::CronStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Sidekiq 任务消息
/// Sidekiq job message
#[derive(Debug, Serialize)]
struct SidekiqJob<'a> {
  class: &'a str,
  args: &'a [Value],
  queue: &'a str,
  retry: &'a RetryPolicy,
  jid: &'a str,
  created_at: f64,
  enqueued_at: f64,
}

/// Sidekiq 兼容队列
/// Sidekiq-compatible queue
pub struct SidekiqQueue {
  store: Arc<dyn CronStore>,
}

impl SidekiqQueue {
  pub fn new(store: Arc<dyn CronStore>) -> Self {
    Self { store }
  }

  /// 生成 24 位十六进制任务 ID（与 Sidekiq 相同长度）
  /// Generate a 24 hex character job id (same length as Sidekiq's)
  fn new_jid() -> String {
    let mut jid = Uuid::new_v4().simple().to_string();
    jid.truncate(24);
    jid
  }
}

#[async_trait]
impl JobQueue for SidekiqQueue {
  async fn enqueue(
    &self,
    queue: &str,
    class: &str,
    args: &[Value],
    retry: &RetryPolicy,
  ) -> Result<String> {
    if queue.is_empty() || class.is_empty() {
      return Err(Error::downstream(queue, class, "queue and class are required"));
    }

    let jid = Self::new_jid();
    let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    let payload = serde_json::to_string(&SidekiqJob {
      class,
      args,
      queue,
      retry,
      jid: &jid,
      created_at: now,
      enqueued_at: now,
    })?;

    self.store.sadd(keys::SIDEKIQ_QUEUES, queue).await?;
    self
      .store
      .lpush(&keys::sidekiq_queue_key(queue), &payload)
      .await?;
    tracing::debug!(queue, class, jid = %jid, "pushed job to sidekiq queue");
    Ok(jid)
  }
}
