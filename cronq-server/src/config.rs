//! Environment-driven configuration for the poller service
//!
//! Every setting has a default so that the service starts against a local Redis with no
//! environment at all.

use crate::error::{Error, Result};
use chrono_tz::Tz;
use cronq::base::constants::DEFAULT_HISTORY_SIZE;
use cronq::config::PollerConfig;
use cronq::entry::{CronEntry, EntryDefinition};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_STATUS_ADDR: &str = "CRONQ_STATUS_ADDR";
pub const ENV_POLL_INTERVAL_SECS: &str = "CRONQ_POLL_INTERVAL_SECS";
pub const ENV_MAX_CONCURRENT_ENTRIES: &str = "CRONQ_MAX_CONCURRENT_ENTRIES";
pub const ENV_SCHEDULE_FILE: &str = "CRONQ_SCHEDULE_FILE";
pub const ENV_TIMEZONE: &str = "CRONQ_TIMEZONE";
pub const ENV_TZ: &str = "TZ";
pub const ENV_HISTORY_SIZE: &str = "CRONQ_HISTORY_SIZE";

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_STATUS_ADDR: &str = "127.0.0.1:7070";

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
  /// Redis connection URL
  pub redis_url: String,
  /// Address of the read-only status endpoint
  pub status_addr: SocketAddr,
  /// Poller settings
  pub poller: PollerConfig,
  /// Optional JSON file of entries registered at start-up
  pub schedule_file: Option<PathBuf>,
  /// Zone in which cron expressions are evaluated
  pub timezone: Tz,
  /// History records kept per entry
  pub history_size: usize,
}

impl ServerConfig {
  /// Read the configuration from the process environment
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build the configuration from an arbitrary key lookup
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let redis_url = lookup(ENV_REDIS_URL).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

    let addr = lookup(ENV_STATUS_ADDR).unwrap_or_else(|| DEFAULT_STATUS_ADDR.to_string());
    let status_addr = addr
      .parse::<SocketAddr>()
      .map_err(|e| Error::config(format!("{ENV_STATUS_ADDR}={addr}: {e}")))?;

    let mut poller = PollerConfig::default();
    if let Some(secs) = lookup(ENV_POLL_INTERVAL_SECS) {
      let secs = secs
        .parse::<u64>()
        .map_err(|e| Error::config(format!("{ENV_POLL_INTERVAL_SECS}={secs}: {e}")))?;
      poller = poller.poll_interval(Duration::from_secs(secs))?;
    }
    if let Some(limit) = lookup(ENV_MAX_CONCURRENT_ENTRIES) {
      let limit = limit
        .parse::<usize>()
        .map_err(|e| Error::config(format!("{ENV_MAX_CONCURRENT_ENTRIES}={limit}: {e}")))?;
      poller.max_concurrent_entries = limit;
    }
    poller.validate()?;

    // CRONQ_TIMEZONE wins over TZ; empty values count as unset
    let timezone = match lookup(ENV_TIMEZONE)
      .filter(|tz| !tz.is_empty())
      .or_else(|| lookup(ENV_TZ).filter(|tz| !tz.is_empty()))
    {
      Some(name) => name
        .parse::<Tz>()
        .map_err(|e| Error::config(format!("timezone {name}: {e}")))?,
      None => Tz::UTC,
    };

    let history_size = match lookup(ENV_HISTORY_SIZE) {
      Some(size) => match size.parse::<usize>() {
        Ok(n) if n > 0 => n,
        Ok(_) => return Err(Error::config(format!("{ENV_HISTORY_SIZE} must be at least 1"))),
        Err(e) => return Err(Error::config(format!("{ENV_HISTORY_SIZE}={size}: {e}"))),
      },
      None => DEFAULT_HISTORY_SIZE,
    };

    let schedule_file = lookup(ENV_SCHEDULE_FILE)
      .filter(|path| !path.is_empty())
      .map(PathBuf::from);

    Ok(Self {
      redis_url,
      status_addr,
      poller,
      schedule_file,
      timezone,
      history_size,
    })
  }
}

/// Parse a JSON array of entry definitions
pub fn parse_schedule(json: &str) -> Result<Vec<CronEntry>> {
  let definitions: Vec<EntryDefinition> = serde_json::from_str(json)?;
  definitions
    .into_iter()
    .map(|def| CronEntry::try_from(def).map_err(Error::from))
    .collect()
}

/// Load entry definitions from a schedule file
pub async fn load_schedule(path: &Path) -> Result<Vec<CronEntry>> {
  let json = tokio::fs::read_to_string(path).await?;
  parse_schedule(&json)
}
