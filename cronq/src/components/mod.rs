//! Lifecycle 模块
//! Lifecycle module
//!
//! 提供通用的后台组件生命周期管理 trait
//! Provides a common trait for managing background components

use std::sync::Arc;
use tokio::task::JoinHandle;

pub mod poller;

/// Lifecycle trait - 组件生命周期管理接口
/// Lifecycle trait - component lifecycle management interface
///
/// # 实现者 / Implementors
///
/// - [`Poller`](poller::Poller) - 周期性检查到期条目并入队
///   - periodically checks for due entries and enqueues them
///
/// # 示例 / Example
///
/// ```rust,no_run
/// use cronq::components::ComponentLifecycle;
/// use cronq::components::poller::Poller;
/// use cronq::config::PollerConfig;
/// use cronq::cron::Cron;
/// use cronq::queue::SidekiqQueue;
/// use cronq::store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let store = Arc::new(MemoryStore::new());
/// let queue = Arc::new(SidekiqQueue::new(store.clone()));
/// let cron = Arc::new(Cron::new(store, queue));
/// let poller = Arc::new(Poller::new(cron, PollerConfig::default()));
///
/// // 启动组件
/// // Start component
/// let handle = poller.clone().start();
/// assert!(!poller.is_done());
///
/// // 关闭组件
/// // Shutdown component
/// poller.shutdown();
/// assert!(poller.is_done());
/// let _ = handle.await;
/// # }
/// ```
pub trait ComponentLifecycle {
  /// 启动组件的后台任务，返回用于等待其结束的 JoinHandle
  /// Start the component's background task, returning a JoinHandle to wait for it
  fn start(self: Arc<Self>) -> JoinHandle<()>;

  /// 发送关闭信号，组件在完成当前操作后停止
  /// Send the shutdown signal; the component stops after its current operation
  fn shutdown(&self);

  /// 组件已停止（或正在停止）时返回 `true`
  /// Returns `true` once the component has stopped or is stopping
  fn is_done(&self) -> bool;
}
