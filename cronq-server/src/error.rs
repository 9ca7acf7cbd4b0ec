//! Error types for cronq-server

use thiserror::Error;

/// Result type for cronq-server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cronq-server
#[derive(Error, Debug)]
pub enum Error {
  /// Scheduler library error
  #[error("Cron error: {0}")]
  Cron(#[from] cronq::Error),

  /// Invalid configuration
  #[error("Configuration error: {0}")]
  Config(String),

  /// Serialization error
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// IO error
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  /// Server error
  #[error("Server error: {0}")]
  Server(String),
}

impl Error {
  /// Create a configuration error
  pub fn config<S: Into<String>>(msg: S) -> Self {
    Self::Config(msg.into())
  }

  /// Create a server error
  pub fn server<S: Into<String>>(msg: S) -> Self {
    Self::Server(msg.into())
  }
}
