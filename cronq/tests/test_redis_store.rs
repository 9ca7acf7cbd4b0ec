//! Redis 存储集成测试
//! Redis store integration tests

use chrono::{TimeZone, Utc};
use cronq::cron::{Cron, EnqueueOutcome};
use cronq::entry::{CronEntry, EntryStatus, Job};
use cronq::queue::SidekiqQueue;
use cronq::redis::RedisConnectionConfig;
use cronq::store::{CronStore, RedisStore};
use std::sync::Arc;
use uuid::Uuid;

async fn connect() -> RedisStore {
  let config = RedisConnectionConfig::single("redis://127.0.0.1:6379").unwrap();
  RedisStore::connect(config).await.unwrap()
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_redis_store_ping() {
  let store = connect().await;
  assert!(store.ping().await.is_ok());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_redis_zadd_nx_single_winner() {
  let store = connect().await;
  let key = format!("cronq:test:{}", Uuid::new_v4());

  let mut handles = Vec::new();
  for _ in 0..16 {
    let store = store.clone();
    let key = key.clone();
    handles.push(tokio::spawn(async move {
      store
        .zadd_nx(&key, "2020-01-02 11:00:00 +0000", 1577962800.0)
        .await
        .unwrap()
    }));
  }
  let mut won = 0;
  for handle in handles {
    won += handle.await.unwrap();
  }
  assert_eq!(won, 1);
  assert_eq!(store.zcard(&key).await.unwrap(), 1);

  store.del(&[key]).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_redis_hash_set_and_list() {
  let store = connect().await;
  let id = Uuid::new_v4();
  let hash = format!("cronq:test:{id}:hash");
  let set = format!("cronq:test:{id}:set");
  let list = format!("cronq:test:{id}:list");

  store
    .hset_multiple(&hash, &[("a".into(), "1".into()), ("b".into(), "2".into())])
    .await
    .unwrap();
  let fields = store.hgetall(&hash).await.unwrap();
  assert_eq!(fields.len(), 2);
  assert_eq!(fields["b"], "2");

  store.sadd(&set, "x").await.unwrap();
  store.sadd(&set, "y").await.unwrap();
  store.srem(&set, "x").await.unwrap();
  assert_eq!(store.smembers(&set).await.unwrap(), vec!["y"]);

  store.lpush(&list, "1").await.unwrap();
  store.lpush(&list, "2").await.unwrap();
  assert_eq!(store.lrange(&list, 0, -1).await.unwrap(), vec!["2", "1"]);

  store.del(&[hash.clone(), set, list]).await.unwrap();
  assert!(store.hgetall(&hash).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_redis_trim_and_prune() {
  let store = connect().await;
  let id = Uuid::new_v4();
  let list = format!("cronq:test:{id}:list");
  let zset = format!("cronq:test:{id}:zset");

  for n in 0..5 {
    store.lpush(&list, &n.to_string()).await.unwrap();
  }
  store.ltrim(&list, 0, 2).await.unwrap();
  assert_eq!(store.lrange(&list, 0, -1).await.unwrap(), vec!["4", "3", "2"]);

  for n in 0..5 {
    store.zadd_nx(&zset, &format!("m{n}"), n as f64 * 60.0).await.unwrap();
  }
  let removed = store
    .zremrangebyscore(&zset, f64::NEG_INFINITY, 120.0)
    .await
    .unwrap();
  assert_eq!(removed, 3);
  assert_eq!(store.zcard(&zset).await.unwrap(), 2);

  store.del(&[list, zset]).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_redis_enqueue_once() {
  let store: Arc<dyn CronStore> = Arc::new(connect().await);
  let queue_name = format!("cronq_test_{}", Uuid::new_v4().simple());
  let cron = Cron::new(store.clone(), Arc::new(SidekiqQueue::new(store.clone())));

  let name = format!("redis test {}", Uuid::new_v4());
  let entry = CronEntry::new(
    name.clone(),
    "0 * * * *",
    EntryStatus::Enabled,
    Job::new(queue_name.clone(), "HourlyWorker"),
  )
  .unwrap();
  cron.add_cron(&entry).await.unwrap();

  let for_time = Utc.with_ymd_and_hms(2020, 1, 2, 11, 0, 0).unwrap();
  let first = cron.enqueue_once(&entry, for_time).await.unwrap();
  assert!(matches!(first, EnqueueOutcome::Enqueued { .. }));
  let second = cron.enqueue_once(&entry, for_time).await.unwrap();
  assert_eq!(second, EnqueueOutcome::AlreadyClaimed);

  let loaded = cron.load_entry(&entry.cron_job_key()).await.unwrap();
  assert_eq!(loaded.last_enqueue_time, Some(for_time));
  assert!(!loaded.should_enqueue(for_time));

  let queue_key = format!("queue:{queue_name}");
  assert_eq!(store.lrange(&queue_key, 0, -1).await.unwrap().len(), 1);

  cron.remove_cron(&name).await.unwrap();
  store.del(&[queue_key]).await.unwrap();
  store.srem("queues", &queue_name).await.unwrap();
}
