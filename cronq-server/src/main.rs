//! Cronq Server binary
//!
//! Runs a cron poller against Redis and serves its counters over HTTP.

use cronq::components::poller::Poller;
use cronq::cron::Cron;
use cronq::queue::SidekiqQueue;
use cronq::redis::RedisConnectionConfig;
use cronq::store::{CronStore, RedisStore};
use cronq_server::config::load_schedule;
use cronq_server::{PollerRegistry, ServerConfig, StatusServer};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialize logging
  tracing_subscriber::registry()
    .with(fmt::layer())
    .with(EnvFilter::from_default_env().add_directive("cronq=info".parse()?))
    .init();

  let config = ServerConfig::from_env()?;
  info!("Starting cronq-server v{}", cronq::base::constants::VERSION);
  info!("Using Redis URL: {}", config.redis_url);

  let redis_config = RedisConnectionConfig::single(config.redis_url.as_str())?;
  let redis = RedisStore::connect(redis_config).await?;
  redis.ping().await?;
  let store: Arc<dyn CronStore> = Arc::new(redis);
  let queue = Arc::new(SidekiqQueue::new(store.clone()));
  let cron = Arc::new(
    Cron::new(store, queue)
      .with_timezone(config.timezone)
      .with_history_size(config.history_size),
  );
  info!("Evaluating schedules in {}", config.timezone);

  if let Some(path) = &config.schedule_file {
    let entries = load_schedule(path).await?;
    for entry in &entries {
      cron.add_cron(entry).await?;
    }
    info!("Registered {} entries from {}", entries.len(), path.display());
  }

  let token = CancellationToken::new();
  let poller = Arc::new(
    Poller::new(cron, config.poller.clone()).with_cancellation_token(token.child_token()),
  );
  let registry = Arc::new(PollerRegistry::new());
  registry.register(poller.clone());
  let poller_handle = poller.clone().start();

  let shutdown = token.clone();
  tokio::spawn(async move {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received shutdown signal, stopping...");
    shutdown.cancel();
  });

  let server = StatusServer::new(config.status_addr, registry.clone());
  if let Err(e) = server.run(token.clone()).await {
    error!("Status server failed: {}", e);
  }

  // Stop the poller whether the server exited cleanly or not
  token.cancel();
  poller.shutdown();
  let _ = tokio::time::timeout(Duration::from_secs(5), poller_handle).await;
  registry.deregister(poller.id());
  info!("Poller {} stopped", poller.id());

  Ok(())
}
