use anyhow::Result;
use tracing::info;

use crate::trading::model::holding::HoldingModel;
use crate::trading::model::portfolio_snapshot::PortfolioSnapshotModel;
use crate::trading::transport::formatter::PortfolioSummary;

/// 汇总持仓并从快照历史推导日/周/月损益。
/// 日损益 = 今日总值 - 昨日快照总值（没有昨日快照时为0）
pub async fn build_report(today: &str) -> Result<PortfolioSummary> {
    let holdings = HoldingModel::new();
    let snapshots = PortfolioSnapshotModel::new();

    let total_value = holdings.total_market_value().await?;
    let daily_pnl = match snapshots.get_latest_before(today).await? {
        Some(prev) => total_value - prev.total_value,
        None => 0.0,
    };
    let weekly_pnl = snapshots.calculate_weekly_pnl(today, total_value).await?;
    let monthly_pnl = snapshots.calculate_monthly_pnl(today, total_value).await?;

    Ok(PortfolioSummary {
        total_value,
        daily_pnl,
        weekly_pnl,
        monthly_pnl,
    })
}

/// 落当日快照（同日重复执行会覆盖，保持一天一份）
pub async fn persist_snapshot(today: &str, report: &PortfolioSummary) -> Result<()> {
    PortfolioSnapshotModel::new()
        .save(today, report.total_value, report.daily_pnl)
        .await?;
    info!(
        "portfolio snapshot saved: {} total={:.0} daily={:+.0}",
        today, report.total_value, report.daily_pnl
    );
    Ok(())
}
