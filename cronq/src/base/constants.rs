use std::time::Duration;

/// 最近入队时间与认领成员使用的时间格式
/// Time layout for last enqueue times and claim members
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S %z";

/// 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// 每个条目保留的入队历史条数
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// 认领成员的保留时长，更早的成员在赢得新认领后被清理
/// How long claim members are kept; older ones are pruned after a new claim is won
pub const DEFAULT_CLAIM_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// 默认队列名称
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// 条目状态字符串
pub const STATUS_ENABLED: &str = "enabled";
pub const STATUS_DISABLED: &str = "disabled";

/// 版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
