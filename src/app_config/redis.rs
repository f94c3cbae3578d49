use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::Client;

use crate::app_config::env::env_or_default;

/// Get a Redis multiplexed async connection using REDIS_HOST from env
pub async fn get_redis_connection() -> Result<MultiplexedConnection> {
    let url = env_or_default("REDIS_HOST", "redis://127.0.0.1/");
    let client = Client::open(url)?;
    let conn = client.get_multiplexed_async_connection().await?;
    Ok(conn)
}

/// 上一次信号快照键（滞后翻转判定用）
pub fn previous_signal_key(symbol_id: &str) -> String {
    format!("signal:prev:{}", symbol_id)
}

/// 通知冷却键
pub fn cooldown_key(symbol_id: &str) -> String {
    format!("notify:cooldown:{}", symbol_id)
}

/// 日次通知计数键（按UTC日期分桶）
pub fn daily_count_key(utc_day: &str) -> String {
    format!("notify:count:{}", utc_day)
}

pub const EMERGENCY_STOP_KEY: &str = "system:emergency_stop";
pub const THRESHOLDS_KEY: &str = "config:thresholds";

/// TTL: 上一次信号 7天
pub const PREVIOUS_SIGNAL_TTL_SECS: u64 = 86400 * 7;
/// TTL: 日次计数 48小时
pub const DAILY_COUNT_TTL_SECS: u64 = 86400 * 2;
