//! Redis 存储实现
//! Redis store implementation
//!
//! 基于多路复用异步连接；认领操作使用 `ZADD NX`，其返回值本身就是仲裁结果。
//! Built on a multiplexed async connection; the claim uses `ZADD NX`, whose reply is the
//! arbitration result itself.

use super::CronStore;
use crate::error::Result;
use crate::redis::RedisConnectionConfig;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;

/// Redis 存储
/// Redis store
#[derive(Clone)]
pub struct RedisStore {
  connection: MultiplexedConnection,
}

impl RedisStore {
  /// 连接 Redis 并创建存储
  /// Connect to Redis and create the store
  pub async fn connect(config: RedisConnectionConfig) -> Result<Self> {
    let client = Client::open(config.connection_info().clone())?;
    let connection = client.get_multiplexed_async_connection().await?;
    Ok(Self { connection })
  }

  /// Ping Redis 连接
  /// Ping the Redis connection
  pub async fn ping(&self) -> Result<()> {
    let mut conn = self.connection.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
  }
}

#[async_trait]
impl CronStore for RedisStore {
  async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<i64> {
    let mut conn = self.connection.clone();
    let added: i64 = redis::cmd("ZADD")
      .arg(key)
      .arg("NX")
      .arg(score)
      .arg(member)
      .query_async(&mut conn)
      .await?;
    Ok(added)
  }

  async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<i64> {
    let mut conn = self.connection.clone();
    let removed: i64 = redis::cmd("ZREMRANGEBYSCORE")
      .arg(key)
      .arg(score_arg(min))
      .arg(score_arg(max))
      .query_async(&mut conn)
      .await?;
    Ok(removed)
  }

  async fn zcard(&self, key: &str) -> Result<i64> {
    let mut conn = self.connection.clone();
    let count: i64 = conn.zcard(key).await?;
    Ok(count)
  }

  async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
    let mut conn = self.connection.clone();
    let fields: HashMap<String, String> = conn.hgetall(key).await?;
    Ok(fields)
  }

  async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
    if fields.is_empty() {
      return Ok(());
    }
    let mut conn = self.connection.clone();
    let _: () = conn.hset_multiple(key, fields).await?;
    Ok(())
  }

  async fn sadd(&self, key: &str, member: &str) -> Result<()> {
    let mut conn = self.connection.clone();
    let _: () = conn.sadd(key, member).await?;
    Ok(())
  }

  async fn srem(&self, key: &str, member: &str) -> Result<()> {
    let mut conn = self.connection.clone();
    let _: () = conn.srem(key, member).await?;
    Ok(())
  }

  async fn smembers(&self, key: &str) -> Result<Vec<String>> {
    let mut conn = self.connection.clone();
    let members: Vec<String> = conn.smembers(key).await?;
    Ok(members)
  }

  async fn lpush(&self, key: &str, value: &str) -> Result<()> {
    let mut conn = self.connection.clone();
    let _: () = conn.lpush(key, value).await?;
    Ok(())
  }

  async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
    let mut conn = self.connection.clone();
    let values: Vec<String> = conn.lrange(key, start, stop).await?;
    Ok(values)
  }

  async fn ltrim(&self, key: &str, start: isize, stop: isize) -> Result<()> {
    let mut conn = self.connection.clone();
    let _: () = conn.ltrim(key, start, stop).await?;
    Ok(())
  }

  async fn del(&self, keys: &[String]) -> Result<()> {
    if keys.is_empty() {
      return Ok(());
    }
    let mut conn = self.connection.clone();
    let _: () = conn.del(keys).await?;
    Ok(())
  }
}

/// Redis 分数参数，无穷大写作 `-inf` / `+inf`
/// Redis score argument; infinities are written as `-inf` / `+inf`
fn score_arg(score: f64) -> String {
  if score == f64::NEG_INFINITY {
    "-inf".to_string()
  } else if score == f64::INFINITY {
    "+inf".to_string()
  } else {
    score.to_string()
  }
}
