//! 存储键名 - 与 sidekiq-cron 部署保持兼容
//! Store key names - compatible with existing sidekiq-cron deployments

/// 所有条目记录键的集合
/// Set holding the record key of every registered entry
pub const ALL_CRON_JOBS: &str = "cron_jobs";

/// Sidekiq 已知队列集合
/// Set of known Sidekiq queues
pub const SIDEKIQ_QUEUES: &str = "queues";

/// 条目记录键: cron_job:<name>
/// Entry record key: cron_job:<name>
pub fn cron_job_key(name: &str) -> String {
  format!("cron_job:{name}")
}

/// 认领有序集合键: cron_job:<name>:enqueued
/// Claim sorted-set key: cron_job:<name>:enqueued
pub fn enqueued_key(name: &str) -> String {
  format!("cron_job:{name}:enqueued")
}

/// 任务 ID 历史列表键: cron_job:<name>:jid_history
/// Job id history list key: cron_job:<name>:jid_history
pub fn jid_history_key(name: &str) -> String {
  format!("cron_job:{name}:jid_history")
}

/// Sidekiq 队列列表键: queue:<name>
/// Sidekiq queue list key: queue:<name>
pub fn sidekiq_queue_key(queue: &str) -> String {
  format!("queue:{queue}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_keys() {
    assert_eq!(cron_job_key("test cron"), "cron_job:test cron");
    assert_eq!(enqueued_key("test cron"), "cron_job:test cron:enqueued");
    assert_eq!(jid_history_key("test cron"), "cron_job:test cron:jid_history");
    assert_eq!(sidekiq_queue_key("default"), "queue:default");
  }
}
