//! 任务队列模块
//! Job queue module
//!
//! 调度器只通过 [`JobQueue::enqueue`] 与下游任务队列交互，并只解释成功或失败。
//! The scheduler talks to the downstream job queue only through [`JobQueue::enqueue`] and only
//! interprets success or failure.

use crate::entry::RetryPolicy;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod sidekiq;

pub use sidekiq::SidekiqQueue;

/// 下游任务队列
/// Downstream job queue
#[async_trait]
pub trait JobQueue: Send + Sync {
  /// 入队一个任务，返回队列分配的任务 ID。重试策略原样交给下游解释。
  /// Enqueue a job, returning the id assigned by the queue. The retry policy is handed to the
  /// queue as is, for it to interpret.
  async fn enqueue(
    &self,
    queue: &str,
    class: &str,
    args: &[Value],
    retry: &RetryPolicy,
  ) -> Result<String>;
}
