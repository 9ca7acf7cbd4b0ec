//! 测试替身
//! Test doubles

use crate::entry::RetryPolicy;
use crate::error::{Error, Result};
use crate::queue::JobQueue;
use crate::store::{CronStore, MemoryStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// 记录调用次数的任务队列
/// Job queue that counts its calls
#[derive(Default)]
pub(crate) struct CountingQueue {
  pub calls: AtomicUsize,
  pub fail: bool,
  pub last_retry: Mutex<Option<RetryPolicy>>,
}

impl CountingQueue {
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl JobQueue for CountingQueue {
  async fn enqueue(
    &self,
    queue: &str,
    class: &str,
    _args: &[Value],
    retry: &RetryPolicy,
  ) -> Result<String> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = self.last_retry.lock() {
      *last = Some(retry.clone());
    }
    if self.fail {
      return Err(Error::downstream(queue, class, "rejected"));
    }
    Ok(format!("jid-{n}"))
  }
}

/// 可按操作类别注入故障的内存存储
/// Memory store with switchable faults per group of operations
#[derive(Default)]
pub(crate) struct FaultyStore {
  pub inner: MemoryStore,
  /// smembers
  pub fail_listing: AtomicBool,
  /// zadd_nx
  pub fail_claim: AtomicBool,
  /// hset_multiple, lpush, ltrim, zremrangebyscore
  pub fail_bookkeeping: AtomicBool,
}

impl FaultyStore {
  fn check(flag: &AtomicBool) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
      return Err(Error::store("connection refused"));
    }
    Ok(())
  }
}

#[async_trait]
impl CronStore for FaultyStore {
  async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<i64> {
    Self::check(&self.fail_claim)?;
    self.inner.zadd_nx(key, member, score).await
  }

  async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<i64> {
    Self::check(&self.fail_bookkeeping)?;
    self.inner.zremrangebyscore(key, min, max).await
  }

  async fn zcard(&self, key: &str) -> Result<i64> {
    self.inner.zcard(key).await
  }

  async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
    self.inner.hgetall(key).await
  }

  async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
    Self::check(&self.fail_bookkeeping)?;
    self.inner.hset_multiple(key, fields).await
  }

  async fn sadd(&self, key: &str, member: &str) -> Result<()> {
    self.inner.sadd(key, member).await
  }

  async fn srem(&self, key: &str, member: &str) -> Result<()> {
    self.inner.srem(key, member).await
  }

  async fn smembers(&self, key: &str) -> Result<Vec<String>> {
    Self::check(&self.fail_listing)?;
    self.inner.smembers(key).await
  }

  async fn lpush(&self, key: &str, value: &str) -> Result<()> {
    Self::check(&self.fail_bookkeeping)?;
    self.inner.lpush(key, value).await
  }

  async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
    self.inner.lrange(key, start, stop).await
  }

  async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
    Self::check(&self.fail_bookkeeping)?;
    self.inner.ltrim(key, start, stop).await
  }

  async fn del(&self, keys: &[String]) -> Result<()> {
    self.inner.del(keys).await
  }
}
