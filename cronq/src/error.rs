//! 错误处理模块
//! Error handling module
//!
//! 定义了 cronq 库中使用的各种错误类型
//! Defines the error types used across the cronq library

use thiserror::Error;

/// cronq 库的结果类型
/// Result type for the cronq library
pub type Result<T> = std::result::Result<T, Error>;

/// cronq 错误类型
/// cronq error type
#[derive(Error, Debug)]
pub enum Error {
  /// 无效的 cron 表达式
  /// Invalid cron expression
  #[error("Invalid cron expression '{expression}': {reason}")]
  InvalidExpression { expression: String, reason: String },

  /// 无效的条目名称
  /// Invalid entry name
  #[error("Invalid entry name: {name:?}")]
  InvalidName { name: String },

  /// 记录缺少必需字段
  /// Record is missing a required field
  #[error("Missing field in cron record: {field}")]
  MissingField { field: &'static str },

  /// 记录字段的 JSON 编码无效
  /// JSON encoding of a record field is invalid
  #[error("Invalid encoding for field {field}: {source}")]
  InvalidEncoding {
    field: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// 时间格式无效
  /// Invalid time format
  #[error("Invalid time format: {value:?}")]
  InvalidTimeFormat { value: String },

  /// 存储不可用
  /// Store unavailable
  #[error("Store unavailable: {message}")]
  StoreUnavailable { message: String },

  /// 下游任务队列拒绝入队
  /// Downstream job queue rejected the enqueue
  #[error("Enqueue of {class} into queue {queue} failed: {message}")]
  DownstreamEnqueueFailed {
    queue: String,
    class: String,
    message: String,
  },

  /// 序列化错误
  /// Serialization error
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// 配置错误
  /// Configuration error
  #[error("Configuration error: {message}")]
  Config { message: String },

  /// IO 错误
  /// IO error
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// 取消错误
  /// Cancellation error
  #[error("Operation cancelled")]
  Cancelled,
}

impl From<redis::RedisError> for Error {
  fn from(err: redis::RedisError) -> Self {
    Self::StoreUnavailable {
      message: err.to_string(),
    }
  }
}

impl Error {
  /// 创建无效表达式错误
  /// Create an invalid expression error
  pub fn invalid_expression<E: Into<String>, R: std::fmt::Display>(expression: E, reason: R) -> Self {
    Self::InvalidExpression {
      expression: expression.into(),
      reason: reason.to_string(),
    }
  }

  /// 创建存储不可用错误
  /// Create a store unavailable error
  pub fn store<S: Into<String>>(message: S) -> Self {
    Self::StoreUnavailable {
      message: message.into(),
    }
  }

  /// 创建配置错误
  /// Create a configuration error
  pub fn config<S: Into<String>>(message: S) -> Self {
    Self::Config {
      message: message.into(),
    }
  }

  /// 创建下游入队错误
  /// Create a downstream enqueue error
  pub fn downstream<Q, C, M>(queue: Q, class: C, message: M) -> Self
  where
    Q: Into<String>,
    C: Into<String>,
    M: std::fmt::Display,
  {
    Self::DownstreamEnqueueFailed {
      queue: queue.into(),
      class: class.into(),
      message: message.to_string(),
    }
  }

  /// 检查错误是否只影响单个条目（加载或构造失败）
  /// Check whether the error is scoped to a single entry (loading or construction failure)
  pub fn is_entry_error(&self) -> bool {
    matches!(
      self,
      Error::InvalidExpression { .. }
        | Error::InvalidName { .. }
        | Error::MissingField { .. }
        | Error::InvalidEncoding { .. }
        | Error::InvalidTimeFormat { .. }
    )
  }

  /// 检查是否为存储错误
  /// Check if the error comes from the store
  pub fn is_store_error(&self) -> bool {
    matches!(self, Error::StoreUnavailable { .. })
  }
}
