//! 内存存储实现
//! Memory store implementation
//!
//! 使用内存数据结构实现存储契约，不依赖任何外部服务。所有操作都在同一把写锁内完成，
//! 因此 `zadd_nx` 在同一进程的并发调用者之间是原子的。
//! Implements the store contract with in-memory data structures and no external services.
//! Every operation runs under a single write lock, so `zadd_nx` is atomic across concurrent
//! callers sharing the same instance.

use super::CronStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 内存存储的数据
/// Memory storage data
#[derive(Default, Debug)]
pub struct MemoryStorage {
  /// 有序集合：key -> (member -> score)
  /// Sorted sets: key -> (member -> score)
  pub sorted_sets: HashMap<String, HashMap<String, f64>>,
  /// 哈希：key -> (field -> value)
  /// Hashes: key -> (field -> value)
  pub hashes: HashMap<String, HashMap<String, String>>,
  /// 集合
  /// Sets
  pub sets: HashMap<String, BTreeSet<String>>,
  /// 列表，头部为索引 0
  /// Lists, head at index 0
  pub lists: HashMap<String, VecDeque<String>>,
}

impl MemoryStorage {
  fn remove(&mut self, key: &str) {
    self.sorted_sets.remove(key);
    self.hashes.remove(key);
    self.sets.remove(key);
    self.lists.remove(key);
  }
}

/// 内存存储，克隆后共享同一份数据
/// Memory store; clones share the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
  storage: Arc<RwLock<MemoryStorage>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// 清空所有数据
  /// Clear all data
  pub async fn flush(&self) {
    *self.storage.write().await = MemoryStorage::default();
  }
}

#[async_trait]
impl CronStore for MemoryStore {
  async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<i64> {
    let mut storage = self.storage.write().await;
    let set = storage.sorted_sets.entry(key.to_string()).or_default();
    if set.contains_key(member) {
      return Ok(0);
    }
    set.insert(member.to_string(), score);
    Ok(1)
  }

  async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<i64> {
    let mut storage = self.storage.write().await;
    let Some(set) = storage.sorted_sets.get_mut(key) else {
      return Ok(0);
    };
    let before = set.len();
    set.retain(|_, score| *score < min || *score > max);
    Ok((before - set.len()) as i64)
  }

  async fn zcard(&self, key: &str) -> Result<i64> {
    let storage = self.storage.read().await;
    Ok(storage.sorted_sets.get(key).map_or(0, |s| s.len() as i64))
  }

  async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
    let storage = self.storage.read().await;
    Ok(storage.hashes.get(key).cloned().unwrap_or_default())
  }

  async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
    let mut storage = self.storage.write().await;
    let hash = storage.hashes.entry(key.to_string()).or_default();
    for (field, value) in fields {
      hash.insert(field.clone(), value.clone());
    }
    Ok(())
  }

  async fn sadd(&self, key: &str, member: &str) -> Result<()> {
    let mut storage = self.storage.write().await;
    storage
      .sets
      .entry(key.to_string())
      .or_default()
      .insert(member.to_string());
    Ok(())
  }

  async fn srem(&self, key: &str, member: &str) -> Result<()> {
    let mut storage = self.storage.write().await;
    if let Some(set) = storage.sets.get_mut(key) {
      set.remove(member);
    }
    Ok(())
  }

  async fn smembers(&self, key: &str) -> Result<Vec<String>> {
    let storage = self.storage.read().await;
    Ok(
      storage
        .sets
        .get(key)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default(),
    )
  }

  async fn lpush(&self, key: &str, value: &str) -> Result<()> {
    let mut storage = self.storage.write().await;
    storage
      .lists
      .entry(key.to_string())
      .or_default()
      .push_front(value.to_string());
    Ok(())
  }

  async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
    let storage = self.storage.read().await;
    let Some(list) = storage.lists.get(key) else {
      return Ok(Vec::new());
    };
    let Some((start, len)) = list_range(list.len(), start, stop) else {
      return Ok(Vec::new());
    };
    Ok(list.iter().skip(start).take(len).cloned().collect())
  }

  async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
    let mut storage = self.storage.write().await;
    let Some(list) = storage.lists.get_mut(key) else {
      return Ok(());
    };
    match list_range(list.len(), start, stop) {
      Some((start, len)) => {
        list.truncate(start + len);
        list.drain(..start);
      }
      None => {
        storage.lists.remove(key);
      }
    }
    Ok(())
  }

  async fn del(&self, keys: &[String]) -> Result<()> {
    let mut storage = self.storage.write().await;
    for key in keys {
      storage.remove(key);
    }
    Ok(())
  }
}

/// 把 Redis 风格的区间（含两端，负数从尾部计数）换算成 (起点, 长度)，区间为空时返回 None
/// Resolve a Redis-style range (inclusive, negative indexes from the tail) into (start, len);
/// None when the range is empty
fn list_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
  let len = len as isize;
  let start = if start < 0 { (len + start).max(0) } else { start };
  let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
  if start > stop || start >= len {
    return None;
  }
  Some((start as usize, (stop - start + 1) as usize))
}
