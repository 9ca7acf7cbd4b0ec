//! 配置模块
//! Configuration module

use crate::base::constants::DEFAULT_POLL_INTERVAL;
use crate::error::{Error, Result};
use std::time::Duration;

/// 轮询器配置
/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
  /// 轮询间隔
  /// Poll interval
  pub poll_interval: Duration,
  /// 单次轮询内并发处理的条目数上限
  /// Upper bound on entries processed concurrently within one tick
  pub max_concurrent_entries: usize,
}

impl Default for PollerConfig {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
      max_concurrent_entries: 1,
    }
  }
}

impl PollerConfig {
  /// 创建新的轮询器配置
  /// Create a new poller configuration
  pub fn new() -> Self {
    Self::default()
  }

  /// 设置轮询间隔，不允许为零
  /// Set the poll interval; zero is rejected
  pub fn poll_interval(mut self, interval: Duration) -> Result<Self> {
    if interval.is_zero() {
      return Err(Error::config("Poll interval must be positive"));
    }
    self.poll_interval = interval;
    Ok(self)
  }

  /// 设置并发条目数
  /// Set the number of concurrently processed entries
  pub fn max_concurrent_entries(mut self, limit: usize) -> Self {
    self.max_concurrent_entries = limit.max(1);
    self
  }

  /// 验证配置
  /// Validate the configuration
  pub fn validate(&self) -> Result<()> {
    if self.poll_interval.is_zero() {
      return Err(Error::config("Poll interval must be positive"));
    }
    if self.max_concurrent_entries == 0 {
      return Err(Error::config("max_concurrent_entries must be at least 1"));
    }
    Ok(())
  }
}
