use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::time_util;
use crate::trading::market::{PriceProvider, PriceSource};
use crate::trading::model::daily_price::{DailyPriceEntity, DailyPriceModel};
use crate::trading::model::event::EventModel;
use crate::trading::model::holding::HoldingModel;
use crate::trading::model::instrument::{InstrumentModel, Market};
use crate::trading::model::notification_log::NotificationLogModel;
use crate::trading::services::portfolio_service;
use crate::trading::signal::aggregator::{decide, ThresholdsConfig};
use crate::trading::gate::{GateStateStore, RedisGateStore};
use crate::trading::transport::formatter::{self, SummaryLine};
use crate::trading::transport::push::{MessageTransport, PushClient};
use crate::DailyBar;

const FETCH_DELAY_MS: u64 = 1200;
/// 日报取的历史天数
const SERIES_DAYS: u32 = 250;

/// 市场日报: 取确定日足 -> 幂等入库 -> 持仓价刷新 -> 全标的信号 -> 快照 -> 一条汇总推送
pub async fn run_daily_summary(market: Market, now: DateTime<Utc>) -> Result<()> {
    info!("daily summary start: {}", market.as_str());
    let store = RedisGateStore;
    let thresholds = store.get_thresholds().await?.unwrap_or_default();
    let transport = PushClient::from_env()?;

    let instruments = InstrumentModel::new().get_all(true).await?;
    let holdings = HoldingModel::new();
    let holding_ids = holdings.get_symbol_ids().await?;
    let events = EventModel::new().get_upcoming(14).await?;
    let prices = DailyPriceModel::new();

    let mut lines = Vec::new();
    for inst in instruments
        .iter()
        .filter(|i| i.market == market.as_str() && i.asset_type != "mutual_fund")
    {
        // 日次确定值覆盖盘中临时行（同键REPLACE，幂等）
        let provider = match inst.asset_type() {
            Some(a) => PriceProvider::for_asset(a),
            None => continue,
        };
        match provider.get_historical_series(&inst.symbol_id, SERIES_DAYS).await {
            Ok(series) => {
                let rows: Vec<DailyPriceEntity> = series
                    .iter()
                    .map(|b| DailyPriceEntity::from_bar(&inst.symbol_id, b, false))
                    .collect();
                prices.insert_batch(&rows).await?;
                if let Some(last) = series.last() {
                    if holding_ids.contains(&inst.symbol_id) {
                        holdings.update_price(&inst.symbol_id, last.c()).await?;
                    }
                }
            }
            Err(e) => {
                warn!("summary fetch failed {}: {}", inst.symbol_id, e);
            }
        }
        tokio::time::sleep(Duration::from_millis(FETCH_DELAY_MS)).await;

        // 信号计算（标的级失败只影响该行）
        match build_summary_line(inst, &thresholds, &events, &holding_ids).await {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => {}
            Err(e) => error!("summary signal failed {}: {}", inst.symbol_id, e),
        }
    }

    // 收盘后清掉旧的盘中临时行
    let today = time_util::utc_day_key(now);
    prices.cleanup_intraday(&today).await?;

    // 资产汇总与快照（一天一份，重复执行覆盖）
    let report = portfolio_service::build_report(&today).await?;
    portfolio_service::persist_snapshot(&today, &report).await?;

    let text = formatter::format_daily_summary(market.as_str(), &lines, Some(&report));
    let log = NotificationLogModel::new();
    match transport.send_push(&text).await {
        Ok(_) => {
            log.add(
                &format!("summary:{}", market.as_str()),
                "SUMMARY",
                &text,
                true,
                None,
            )
            .await?;
        }
        Err(e) => {
            log.add(
                &format!("summary:{}", market.as_str()),
                "SUMMARY",
                &text,
                false,
                Some(e.to_string()),
            )
            .await?;
        }
    }
    info!("daily summary done: {} ({} lines)", market.as_str(), lines.len());
    Ok(())
}

async fn build_summary_line(
    inst: &crate::trading::model::instrument::InstrumentEntity,
    thresholds: &ThresholdsConfig,
    events: &[crate::trading::model::event::EventEntity],
    holding_ids: &[String],
) -> Result<Option<SummaryLine>> {
    let rows = DailyPriceModel::new().get_recent(&inst.symbol_id, 200).await?;
    let bars: Vec<DailyBar> = rows.iter().filter_map(|r| r.to_bar().ok()).collect();
    if bars.len() < crate::trading::indicator::MIN_BARS {
        return Ok(None);
    }
    let symbol_events = EventModel::filter_for_symbol(events, &inst.symbol_id);
    let decision = decide(
        &inst.symbol_id,
        &inst.name,
        &bars,
        thresholds,
        &symbol_events,
        holding_ids.contains(&inst.symbol_id),
    )?;
    let close = bars.last().map(|b| b.c()).unwrap_or(0.0);
    Ok(Some(SummaryLine {
        symbol_id: inst.symbol_id.clone(),
        name: inst.name.clone(),
        action: decision.action,
        confidence: decision.confidence,
        close,
    }))
}
