use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::time_util;
use crate::trading::model::notification_log::NotificationLogModel;
use crate::trading::model::signal_history::SignalHistoryModel;
use crate::trading::services::portfolio_service;
use crate::trading::transport::formatter;
use crate::trading::transport::push::{MessageTransport, PushClient};

/// 周报（周六10:00 UTC）: 本周信号数 + 资产周/月损益
pub async fn run_weekly_summary(now: DateTime<Utc>) -> Result<()> {
    let transport = PushClient::from_env()?;
    let week_ago = now.timestamp_millis() - 7 * 24 * 3600 * 1000;
    let signal_count = SignalHistoryModel::new().count_since(week_ago).await?;

    let today = time_util::utc_day_key(now);
    let report = portfolio_service::build_report(&today).await?;

    let text = formatter::format_weekly_summary(signal_count, Some(&report));
    let log = NotificationLogModel::new();
    match transport.send_push(&text).await {
        Ok(_) => {
            log.add("summary:weekly", "SUMMARY", &text, true, None).await?;
        }
        Err(e) => {
            log.add("summary:weekly", "SUMMARY", &text, false, Some(e.to_string()))
                .await?;
        }
    }
    info!("weekly summary done ({} signals)", signal_count);
    Ok(())
}
