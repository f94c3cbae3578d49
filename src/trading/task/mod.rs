use anyhow::Result;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use tokio_cron_scheduler::Job;
use tracing::{error, info};

use crate::time_util;
use crate::trading::gate::{GateStateStore, RedisGateStore};
use crate::trading::model::instrument::Market;
use crate::trading::transport::push::{MessageTransport, PushClient};

pub mod fund_job;
pub mod init_job;
pub mod monitor_job;
pub mod summary_job;
pub mod weekly_job;

/// 5分钟一跳的调度入口。真正跑哪个任务由当时的UTC壁钟决定
pub async fn register_jobs() -> Result<()> {
    let scheduler = crate::init_scheduler().await?;
    let job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
        Box::pin(async move {
            let now = Utc::now();
            if let Err(e) = route_scheduled_tick(now).await {
                error!("scheduled tick failed: {}", e);
                report_tick_failure(&e).await;
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("scheduler started (tick every 5 minutes)");
    Ok(())
}

/// 壁钟路由（UTC）:
/// - 07:00 JP日报 / 22:00 US日报 / 13:00 投信刷新 / 周六10:00 周报
/// - 其余时段，任一市场开盘中则跑监视tick
pub async fn route_scheduled_tick(now: DateTime<Utc>) -> Result<()> {
    let hour = now.hour();
    let minute = now.minute();
    let in_first_slot = minute < 5;

    if now.weekday() == Weekday::Sat && hour == 10 && in_first_slot {
        return weekly_job::run_weekly_summary(now).await;
    }
    if hour == 7 && in_first_slot {
        return summary_job::run_daily_summary(Market::Jp, now).await;
    }
    if hour == 22 && in_first_slot {
        return summary_job::run_daily_summary(Market::Us, now).await;
    }
    if hour == 13 && in_first_slot {
        return fund_job::run_fund_refresh(now).await;
    }

    if time_util::is_jp_market_open(now) || time_util::is_us_market_open(now) {
        return monitor_job::run_monitor_tick(now).await;
    }
    Ok(())
}

/// tick级失败时的系统告警（一条、受紧急停止约束）
async fn report_tick_failure(err: &anyhow::Error) {
    let store = RedisGateStore;
    if let Ok(true) = store.is_emergency_stop().await {
        return;
    }
    if let Ok(transport) = PushClient::from_env() {
        let _ = transport
            .send_push(&format!("⚠ 系统异常、本轮tick中断: {}", err))
            .await;
    }
}
