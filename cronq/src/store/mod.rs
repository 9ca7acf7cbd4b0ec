//! 存储模块
//! Store module
//!
//! 定义调度器消费的窄存储契约。跨进程协调只依赖其中一个原子操作：`zadd_nx`。
//! Defines the narrow store contract consumed by the scheduler. Cross-process coordination
//! relies on exactly one atomic operation in it: `zadd_nx`.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

/// 存储特性，对应 Redis 的一小组命令
/// Store trait, mirroring a small set of Redis commands
#[async_trait]
pub trait CronStore: Send + Sync {
  /// 仅当成员不存在时加入有序集合，返回新插入的成员数（0 或 1）- Redis: ZADD NX
  /// Add a member to a sorted set only if absent; returns how many members were inserted
  /// (0 or 1) - Redis: ZADD NX
  async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<i64>;

  /// 删除分数在 `[min, max]` 内的成员，返回删除数 - Redis: ZREMRANGEBYSCORE
  /// Remove members scored within `[min, max]`, returning how many were removed
  /// - Redis: ZREMRANGEBYSCORE
  async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<i64>;

  /// 有序集合成员数 - Redis: ZCARD
  /// Sorted set cardinality - Redis: ZCARD
  async fn zcard(&self, key: &str) -> Result<i64>;

  /// 读取哈希的全部字段 - Redis: HGETALL
  /// Read all fields of a hash - Redis: HGETALL
  async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

  /// 写入/合并哈希字段 - Redis: HSET
  /// Write or merge hash fields - Redis: HSET
  async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()>;

  /// 加入集合 - Redis: SADD
  /// Add to a set - Redis: SADD
  async fn sadd(&self, key: &str, member: &str) -> Result<()>;

  /// 从集合移除 - Redis: SREM
  /// Remove from a set - Redis: SREM
  async fn srem(&self, key: &str, member: &str) -> Result<()>;

  /// 列出集合成员 - Redis: SMEMBERS
  /// List set members - Redis: SMEMBERS
  async fn smembers(&self, key: &str) -> Result<Vec<String>>;

  /// 列表头部插入 - Redis: LPUSH
  /// Prepend to a list - Redis: LPUSH
  async fn lpush(&self, key: &str, value: &str) -> Result<()>;

  /// 读取列表区间（含两端，负数从尾部计数）- Redis: LRANGE
  /// Read a list range (inclusive, negative indexes count from the tail) - Redis: LRANGE
  async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

  /// 只保留列表区间（含两端）内的元素 - Redis: LTRIM
  /// Keep only the elements of a list range (inclusive) - Redis: LTRIM
  async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()>;

  /// 删除键 - Redis: DEL
  /// Delete keys - Redis: DEL
  async fn del(&self, keys: &[String]) -> Result<()>;
}
