use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::time_util;
use crate::trading::gate::{
    GateOutcome, GateStateStore, NotificationGate, PreviousSignal, RedisGateStore,
};
use crate::trading::indicator::MIN_BARS;
use crate::trading::market::{latest_quote_with_fallback, PriceProvider};
use crate::trading::model::daily_price::{DailyPriceEntity, DailyPriceModel};
use crate::trading::model::event::{EventEntity, EventModel};
use crate::trading::model::holding::HoldingModel;
use crate::trading::model::instrument::{AssetType, InstrumentEntity, InstrumentModel};
use crate::trading::model::notification_log::NotificationLogModel;
use crate::trading::model::signal_history::SignalHistoryModel;
use crate::trading::signal::aggregator::{decide, ThresholdsConfig};
use crate::trading::signal::Action;
use crate::trading::transport::push::PushClient;
use crate::DailyBar;

/// 行情源之间的间隔（对免费源限速）
const FETCH_DELAY_MS: u64 = 1000;

/// 监视tick: 开盘中的标的逐个 取价 -> 幂等入库 -> 指标 -> L1-L4 -> 聚合 -> 门控。
/// 单个标的失败只跳过该标的，存储级错误让整轮tick失败
pub async fn run_monitor_tick(now: DateTime<Utc>) -> Result<()> {
    let store = RedisGateStore;
    let thresholds = store.get_thresholds().await?.unwrap_or_default();
    let transport = PushClient::from_env()?;

    let instruments = InstrumentModel::new().get_all(true).await?;
    let holding_ids = HoldingModel::new().get_symbol_ids().await?;
    let events = EventModel::new().get_upcoming(14).await?;

    let jp_open = time_util::is_jp_market_open(now);
    let us_open = time_util::is_us_market_open(now);

    let mut processed = 0usize;
    for inst in &instruments {
        let market_open = match inst.market.as_str() {
            "JP" => jp_open,
            "US" => us_open,
            _ => false,
        };
        let asset_type = match inst.asset_type() {
            Some(a) => a,
            None => {
                error!("{}: unknown asset_type {}", inst.symbol_id, inst.asset_type);
                continue;
            }
        };
        // 投信没有盘中价，监视tick跳过
        if !market_open || asset_type == AssetType::MutualFund {
            continue;
        }

        let is_holding = holding_ids.contains(&inst.symbol_id);
        match process_instrument(
            &store, &transport, &thresholds, inst, asset_type, &events, is_holding, now,
        )
        .await
        {
            Ok(_) => processed += 1,
            Err(e) => {
                // 标的级失败（取数/数据不足/计算越界）隔离后继续；
                // 存储类失败中断整轮tick
                let per_instrument = e
                    .downcast_ref::<AppError>()
                    .map(|a| a.is_per_instrument())
                    .unwrap_or(false);
                if !per_instrument {
                    return Err(e);
                }
                error!("monitor skip {}: {}", inst.symbol_id, e);
            }
        }
        tokio::time::sleep(Duration::from_millis(FETCH_DELAY_MS)).await;
    }
    info!("monitor tick done: {}/{} instruments", processed, instruments.len());
    Ok(())
}

async fn process_instrument(
    store: &RedisGateStore,
    transport: &PushClient,
    thresholds: &ThresholdsConfig,
    inst: &InstrumentEntity,
    asset_type: AssetType,
    events: &[EventEntity],
    is_holding: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let prices = DailyPriceModel::new();

    // 1. 取最新报价（主力源失败退JSON源），盘中临时行幂等覆盖
    let provider = PriceProvider::for_asset(asset_type);
    match latest_quote_with_fallback(&provider, &inst.symbol_id).await {
        Ok(quote) => {
            let date = time_util::market_local_date(&inst.market, now);
            let prev = if quote.prev_close > 0.0 {
                quote.prev_close
            } else {
                quote.price
            };
            let bar = DailyBar::builder()
                .date(&date)
                .o(prev)
                .h(quote.price.max(prev))
                .l(quote.price.min(prev))
                .c(quote.price)
                .v(0.0)
                .build()?;
            prices
                .insert(&DailyPriceEntity::from_bar(&inst.symbol_id, &bar, true))
                .await?;
            if is_holding {
                HoldingModel::new()
                    .update_price(&inst.symbol_id, quote.price)
                    .await?;
            }
        }
        Err(e) => {
            // 重试后仍失败: 本轮跳过该标的，不影响通知状态
            return Err(AppError::FetchError(e.to_string()).into());
        }
    }

    // 2. 从库里读最近200根，数据不足debug记录后跳过
    let rows = prices.get_recent(&inst.symbol_id, 200).await?;
    let bars: Vec<DailyBar> = rows.iter().filter_map(|r| r.to_bar().ok()).collect();
    if bars.len() < MIN_BARS {
        debug!(
            "{}: only {} bars (<{}), skip signal generation",
            inst.symbol_id,
            bars.len(),
            MIN_BARS
        );
        return Ok(());
    }

    // 3. 指标 -> L1-L4 -> Decision
    let symbol_events = EventModel::filter_for_symbol(events, &inst.symbol_id);
    let decision = decide(
        &inst.symbol_id,
        &inst.name,
        &bars,
        thresholds,
        &symbol_events,
        is_holding,
    )?;

    // 4. 非HOLD落信号历史
    if decision.action != Action::Hold {
        SignalHistoryModel::new().add(&decision).await?;
    }

    // 5. 先读前回快照，有变化才覆写（写省略）
    let previous = store.get_previous_signal(&inst.symbol_id).await?;
    let changed = previous.as_ref().map(|p| p.action) != Some(decision.action);
    if changed {
        store
            .set_previous_signal(&inst.symbol_id, &PreviousSignal::from(&decision))
            .await?;
    }

    // 6. 门控判定 + 审计日志
    let gate = NotificationGate::new(store, transport, thresholds.clone());
    match gate.evaluate(&decision, previous.as_ref(), now).await? {
        GateOutcome::Notified { message } => {
            NotificationLogModel::new()
                .add(
                    &inst.symbol_id,
                    decision.action.as_str(),
                    &message,
                    true,
                    None,
                )
                .await?;
        }
        GateOutcome::SendFailed { message, error } => {
            NotificationLogModel::new()
                .add(
                    &inst.symbol_id,
                    decision.action.as_str(),
                    &message,
                    false,
                    Some(error),
                )
                .await?;
        }
        GateOutcome::Suppressed { reason } => {
            debug!("{}: suppressed {:?}", inst.symbol_id, reason);
        }
    }
    Ok(())
}
