//! Registry of running pollers
//!
//! The registry is an explicit object shared with the HTTP handlers; it holds no scheduling
//! state of its own and only exposes counters for reporting.

use cronq::components::poller::Poller;
use cronq::stats::PollerStatsSnapshot;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counters of one registered poller
#[derive(Debug, Clone, Serialize)]
pub struct PollerStatus {
  pub id: String,
  #[serde(flatten)]
  pub stats: PollerStatsSnapshot,
}

/// Aggregated view over all registered pollers
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsReport {
  pub pollers: Vec<PollerStatus>,
  pub totals: PollerStatsSnapshot,
}

/// Process-wide poller registry
#[derive(Default)]
pub struct PollerRegistry {
  pollers: Mutex<HashMap<String, Arc<Poller>>>,
}

impl PollerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  // A panic in another holder leaves the map intact
  fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Poller>>> {
    self.pollers.lock().unwrap_or_else(|poisoned| {
      tracing::warn!("poller registry lock was poisoned, recovering");
      PoisonError::into_inner(poisoned)
    })
  }

  /// Register a poller under its id
  pub fn register(&self, poller: Arc<Poller>) {
    tracing::debug!(poller = poller.id(), "registered poller");
    self.lock().insert(poller.id().to_string(), poller);
  }

  /// Remove a poller; returns it when it was registered
  pub fn deregister(&self, id: &str) -> Option<Arc<Poller>> {
    self.lock().remove(id)
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Snapshot the counters of every registered poller, sorted by id
  pub fn snapshot(&self) -> StatsReport {
    let pollers: Vec<Arc<Poller>> = self.lock().values().cloned().collect();

    let mut report = StatsReport::default();
    for poller in pollers {
      let stats = poller.stats().snapshot();
      report.totals += &stats;
      report.pollers.push(PollerStatus {
        id: poller.id().to_string(),
        stats,
      });
    }
    report.pollers.sort_by(|a, b| a.id.cmp(&b.id));
    report
  }
}
