use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::trading::market::{PriceProvider, PriceSource};
use crate::trading::model::daily_price::{DailyPriceEntity, DailyPriceModel};
use crate::trading::model::event::EventModel;
use crate::trading::model::holding::HoldingModel;
use crate::trading::model::instrument::InstrumentModel;
use crate::trading::model::notification_log::NotificationLogModel;
use crate::trading::model::portfolio_snapshot::PortfolioSnapshotModel;
use crate::trading::model::signal_history::SignalHistoryModel;

const FETCH_DELAY_MS: u64 = 1200;
/// 初始化时回填的历史长度
const SEED_DAYS: u32 = 400;

/// 建表
pub async fn create_tables() -> Result<()> {
    InstrumentModel::new().create_table().await?;
    HoldingModel::new().create_table().await?;
    DailyPriceModel::new().create_table().await?;
    EventModel::new().create_table().await?;
    SignalHistoryModel::new().create_table().await?;
    NotificationLogModel::new().create_table().await?;
    PortfolioSnapshotModel::new().create_table().await?;
    info!("tables ready");
    Ok(())
}

/// 历史日足回填（admin initialize）。逐标的拉取、幂等写入
pub async fn seed_historical_series() -> Result<()> {
    create_tables().await?;
    let instruments = InstrumentModel::new().get_all(true).await?;
    let prices = DailyPriceModel::new();

    for inst in &instruments {
        let provider = match inst.asset_type() {
            Some(a) => PriceProvider::for_asset(a),
            None => continue,
        };
        match provider.get_historical_series(&inst.symbol_id, SEED_DAYS).await {
            Ok(series) => {
                let rows: Vec<DailyPriceEntity> = series
                    .iter()
                    .map(|b| DailyPriceEntity::from_bar(&inst.symbol_id, b, false))
                    .collect();
                let n = prices.insert_batch(&rows).await?;
                info!("seeded {}: {} bars", inst.symbol_id, n);
            }
            Err(e) => warn!("seed failed {}: {}", inst.symbol_id, e),
        }
        tokio::time::sleep(Duration::from_millis(FETCH_DELAY_MS)).await;
    }
    Ok(())
}
