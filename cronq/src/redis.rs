//! Redis 配置模块
//! Redis configuration module

use crate::error::Result;
use redis::{ConnectionInfo, IntoConnectionInfo};

/// Redis 连接配置
/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConnectionConfig {
  connection_info: ConnectionInfo,
}

impl RedisConnectionConfig {
  /// 创建单机连接配置
  /// Create a standalone connection configuration
  pub fn single<T: IntoConnectionInfo>(connection_info: T) -> Result<Self> {
    Ok(Self {
      connection_info: connection_info.into_connection_info()?,
    })
  }

  pub fn connection_info(&self) -> &ConnectionInfo {
    &self.connection_info
  }
}
