//! # Cronq
//!
//! Distributed cron scheduling on top of Redis with Sidekiq-compatible jobs
//!
//! Cronq 在多个进程中同时运行同一份定时计划，借助存储端的原子认领保证每个条目每个周期只入队一次。
//! Cronq runs the same cron schedule in many processes at once and relies on an atomic claim in
//! the shared store so that every entry is enqueued exactly once per period.
//!
//! ## 特性
//! ## Features
//!
//! - 标准五字段 cron 表达式，按分钟粒度、UTC 计算
//!   - Standard five-field cron expressions, evaluated per minute in UTC
//! - 与 Ruby sidekiq-cron 相同的存储布局
//!   - Storage layout shared with Ruby sidekiq-cron
//! - 每个周期只入队一次，可安全地横向扩展
//!   - Exactly one enqueue per period, safe to scale out
//! - 单个条目出错不会影响其他条目
//!   - A failing entry never affects the others
//! - 内存存储，便于测试
//!   - In-memory store for tests
//!
//! ## 快速开始
//! ## Quick Start
//!
//! ```rust,no_run
//! use cronq::components::poller::Poller;
//! use cronq::config::PollerConfig;
//! use cronq::cron::Cron;
//! use cronq::entry::{CronEntry, EntryStatus, Job};
//! use cronq::queue::SidekiqQueue;
//! use cronq::redis::RedisConnectionConfig;
//! use cronq::store::RedisStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 连接 Redis
//!     // Connect to Redis
//!     let config = RedisConnectionConfig::single("redis://127.0.0.1:6379")?;
//!     let store = Arc::new(RedisStore::connect(config).await?);
//!     let queue = Arc::new(SidekiqQueue::new(store.clone()));
//!     let cron = Arc::new(Cron::new(store, queue));
//!
//!     // 注册条目
//!     // Register an entry
//!     let entry = CronEntry::new("hourly", "0 * * * *", EntryStatus::Enabled, Job::new("default", "HourlyWorker"))?;
//!     cron.add_cron(&entry).await?;
//!
//!     // 启动轮询
//!     // Start polling
//!     let poller = Arc::new(Poller::new(cron, PollerConfig::default()));
//!     poller.clone().start().await?;
//!     Ok(())
//! }
//! ```

pub mod base;
pub mod components;
pub mod config;
pub mod cron;
pub mod entry;
pub mod error;
pub mod queue;
pub mod record;
pub mod redis;
pub mod schedule;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
