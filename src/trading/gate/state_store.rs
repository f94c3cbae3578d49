use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::app_config::redis as redis_config;
use crate::time_util;
use crate::trading::signal::aggregator::{Decision, ThresholdsConfig};
use crate::trading::signal::Action;

/// 上一次判断的快照（滞后翻转与WATCH去重的依据）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousSignal {
    pub action: Action,
    pub confidence: f64,
    pub decided_at: i64,
}

impl From<&Decision> for PreviousSignal {
    fn from(d: &Decision) -> Self {
        Self {
            action: d.action,
            confidence: d.confidence,
            decided_at: d.decided_at,
        }
    }
}

/// 通知门控的易失状态。全部带TTL存放在kv，进程重启不丢失
#[async_trait]
pub trait GateStateStore: Send + Sync {
    async fn get_previous_signal(&self, symbol_id: &str) -> Result<Option<PreviousSignal>>;
    /// TTL 7天
    async fn set_previous_signal(&self, symbol_id: &str, signal: &PreviousSignal) -> Result<()>;
    async fn is_in_cooldown(&self, symbol_id: &str) -> Result<bool>;
    /// TTL = hours
    async fn set_cooldown(&self, symbol_id: &str, hours: u32) -> Result<()>;
    async fn get_daily_notify_count(&self, day_key: &str) -> Result<u32>;
    /// TTL 48小时，按UTC日期分桶
    async fn increment_daily_notify_count(&self, day_key: &str) -> Result<u32>;
    async fn is_emergency_stop(&self) -> Result<bool>;
    async fn set_emergency_stop(&self, on: bool) -> Result<()>;
    async fn get_thresholds(&self) -> Result<Option<ThresholdsConfig>>;
    async fn set_thresholds(&self, cfg: &ThresholdsConfig) -> Result<()>;
}

/// Redis实现。每次调用取MultiplexedConnection，不跨await持锁
pub struct RedisGateStore;

#[async_trait]
impl GateStateStore for RedisGateStore {
    async fn get_previous_signal(&self, symbol_id: &str) -> Result<Option<PreviousSignal>> {
        let mut conn = redis_config::get_redis_connection().await?;
        let raw: Option<String> = conn.get(redis_config::previous_signal_key(symbol_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_previous_signal(&self, symbol_id: &str, signal: &PreviousSignal) -> Result<()> {
        let mut conn = redis_config::get_redis_connection().await?;
        let json = serde_json::to_string(signal)?;
        conn.set_ex::<_, _, ()>(
            redis_config::previous_signal_key(symbol_id),
            json,
            redis_config::PREVIOUS_SIGNAL_TTL_SECS,
        )
        .await?;
        Ok(())
    }

    async fn is_in_cooldown(&self, symbol_id: &str) -> Result<bool> {
        let mut conn = redis_config::get_redis_connection().await?;
        let exists: bool = conn.exists(redis_config::cooldown_key(symbol_id)).await?;
        Ok(exists)
    }

    async fn set_cooldown(&self, symbol_id: &str, hours: u32) -> Result<()> {
        let mut conn = redis_config::get_redis_connection().await?;
        conn.set_ex::<_, _, ()>(
            redis_config::cooldown_key(symbol_id),
            "1",
            hours as u64 * 3600,
        )
        .await?;
        Ok(())
    }

    async fn get_daily_notify_count(&self, day_key: &str) -> Result<u32> {
        let mut conn = redis_config::get_redis_connection().await?;
        let count: Option<u32> = conn.get(redis_config::daily_count_key(day_key)).await?;
        Ok(count.unwrap_or(0))
    }

    async fn increment_daily_notify_count(&self, day_key: &str) -> Result<u32> {
        let mut conn = redis_config::get_redis_connection().await?;
        let key = redis_config::daily_count_key(day_key);
        let count: u32 = conn.incr(&key, 1u32).await?;
        // 每次都刷新TTL，保证>=48h后自动过期
        conn.expire::<_, ()>(&key, redis_config::DAILY_COUNT_TTL_SECS as i64)
            .await?;
        Ok(count)
    }

    async fn is_emergency_stop(&self) -> Result<bool> {
        let mut conn = redis_config::get_redis_connection().await?;
        let v: Option<String> = conn.get(redis_config::EMERGENCY_STOP_KEY).await?;
        Ok(v.as_deref() == Some("1"))
    }

    async fn set_emergency_stop(&self, on: bool) -> Result<()> {
        let mut conn = redis_config::get_redis_connection().await?;
        if on {
            conn.set::<_, _, ()>(redis_config::EMERGENCY_STOP_KEY, "1").await?;
        } else {
            conn.del::<_, ()>(redis_config::EMERGENCY_STOP_KEY).await?;
        }
        Ok(())
    }

    async fn get_thresholds(&self) -> Result<Option<ThresholdsConfig>> {
        let mut conn = redis_config::get_redis_connection().await?;
        let raw: Option<String> = conn.get(redis_config::THRESHOLDS_KEY).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_thresholds(&self, cfg: &ThresholdsConfig) -> Result<()> {
        let mut conn = redis_config::get_redis_connection().await?;
        conn.set::<_, _, ()>(redis_config::THRESHOLDS_KEY, serde_json::to_string(cfg)?)
            .await?;
        Ok(())
    }
}

/// 内存实现（测试与dry-run用）。cooldown以过期时刻表示
#[derive(Default)]
pub struct MemoryGateStore {
    inner: Mutex<MemoryGateState>,
}

#[derive(Default)]
struct MemoryGateState {
    previous: HashMap<String, PreviousSignal>,
    cooldown_until: HashMap<String, i64>,
    daily_count: HashMap<String, u32>,
    emergency_stop: bool,
    thresholds: Option<ThresholdsConfig>,
}

impl MemoryGateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GateStateStore for MemoryGateStore {
    async fn get_previous_signal(&self, symbol_id: &str) -> Result<Option<PreviousSignal>> {
        Ok(self.inner.lock().await.previous.get(symbol_id).cloned())
    }

    async fn set_previous_signal(&self, symbol_id: &str, signal: &PreviousSignal) -> Result<()> {
        self.inner
            .lock()
            .await
            .previous
            .insert(symbol_id.to_string(), signal.clone());
        Ok(())
    }

    async fn is_in_cooldown(&self, symbol_id: &str) -> Result<bool> {
        let now = time_util::now_millis();
        Ok(self
            .inner
            .lock()
            .await
            .cooldown_until
            .get(symbol_id)
            .map(|until| now < *until)
            .unwrap_or(false))
    }

    async fn set_cooldown(&self, symbol_id: &str, hours: u32) -> Result<()> {
        let until = time_util::now_millis() + hours as i64 * 3600 * 1000;
        self.inner
            .lock()
            .await
            .cooldown_until
            .insert(symbol_id.to_string(), until);
        Ok(())
    }

    async fn get_daily_notify_count(&self, day_key: &str) -> Result<u32> {
        Ok(*self.inner.lock().await.daily_count.get(day_key).unwrap_or(&0))
    }

    async fn increment_daily_notify_count(&self, day_key: &str) -> Result<u32> {
        let mut state = self.inner.lock().await;
        let count = state.daily_count.entry(day_key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn is_emergency_stop(&self) -> Result<bool> {
        Ok(self.inner.lock().await.emergency_stop)
    }

    async fn set_emergency_stop(&self, on: bool) -> Result<()> {
        self.inner.lock().await.emergency_stop = on;
        Ok(())
    }

    async fn get_thresholds(&self) -> Result<Option<ThresholdsConfig>> {
        Ok(self.inner.lock().await.thresholds.clone())
    }

    async fn set_thresholds(&self, cfg: &ThresholdsConfig) -> Result<()> {
        self.inner.lock().await.thresholds = Some(cfg.clone());
        Ok(())
    }
}
