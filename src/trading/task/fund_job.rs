use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use crate::trading::market::{PriceProvider, PriceSource};
use crate::trading::model::daily_price::{DailyPriceEntity, DailyPriceModel};
use crate::trading::model::holding::HoldingModel;
use crate::trading::model::instrument::InstrumentModel;

/// 基金页面抓取的限速更保守
const FETCH_DELAY_MS: u64 = 2000;
const NAV_DAYS: u32 = 250;

/// 投信基准价刷新（13:00 UTC）。只更新价格，不产生信号
pub async fn run_fund_refresh(_now: DateTime<Utc>) -> Result<()> {
    let instruments = InstrumentModel::new().get_all(true).await?;
    let prices = DailyPriceModel::new();
    let holdings = HoldingModel::new();
    let holding_ids = holdings.get_symbol_ids().await?;

    let mut updated = 0usize;
    for inst in instruments.iter().filter(|i| i.asset_type == "mutual_fund") {
        let provider = match inst.asset_type() {
            Some(a) => PriceProvider::for_asset(a),
            None => continue,
        };
        match provider.get_historical_series(&inst.symbol_id, NAV_DAYS).await {
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
                updated += 1;
            }
            Err(e) => warn!("fund refresh failed {}: {}", inst.symbol_id, e),
        }
        tokio::time::sleep(Duration::from_millis(FETCH_DELAY_MS)).await;
    }
    info!("fund refresh done: {} funds", updated);
    Ok(())
}
