//! # Cronq Server
//!
//! A standalone cron poller with a read-only HTTP status surface.
//!
//! ## Overview
//!
//! `cronq-server` connects to Redis, registers the entries of an optional schedule file, runs a
//! [`Poller`](cronq::components::poller::Poller) and serves its counters:
//!
//! - `GET /stats`: per-poller counters and their totals
//! - `GET /health`: liveness check
//!
//! Any number of these processes may run against the same Redis; each due entry is still
//! enqueued once per period.
//!
//! ## Configuration
//!
//! | Variable | Default |
//! |----------|---------|
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `CRONQ_STATUS_ADDR` | `127.0.0.1:7070` |
//! | `CRONQ_POLL_INTERVAL_SECS` | `30` |
//! | `CRONQ_MAX_CONCURRENT_ENTRIES` | `1` |
//! | `CRONQ_SCHEDULE_FILE` | unset |
//! | `CRONQ_TIMEZONE` (falls back to `TZ`) | `UTC` |
//! | `CRONQ_HISTORY_SIZE` | `10` |

pub mod config;
pub mod error;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use registry::PollerRegistry;
pub use server::StatusServer;
