extern crate rbatis;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};

use crate::app_config::db;

/// 每个自然日一份的资产快照。周/月损益从历史快照推导
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioSnapshotEntity {
    pub snapshot_date: String,
    pub total_value: f64,
    pub daily_pnl: f64,
    pub month_start_value: f64,
}

crud!(PortfolioSnapshotEntity {}, "portfolio_snapshot");

pub struct PortfolioSnapshotModel {
    db: &'static RBatis,
}

impl PortfolioSnapshotModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `portfolio_snapshot` (
            `snapshot_date` varchar(10) NOT NULL,
            `total_value` double NOT NULL,
            `daily_pnl` double NOT NULL DEFAULT 0,
            `month_start_value` double NOT NULL DEFAULT 0,
            PRIMARY KEY (`snapshot_date`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    /// 保存当日快照（重复保存覆盖，一天只留一份）
    pub async fn save(&self, date: &str, total_value: f64, daily_pnl: f64) -> Result<ExecResult> {
        let month_start = self.get_month_start_value(date).await?.unwrap_or(total_value);
        let sql = "REPLACE INTO portfolio_snapshot (snapshot_date, total_value, daily_pnl, month_start_value) VALUES (?, ?, ?, ?)";
        let res = self
            .db
            .exec(
                sql,
                vec![
                    rbs::to_value!(date),
                    rbs::to_value!(total_value),
                    rbs::to_value!(daily_pnl),
                    rbs::to_value!(month_start),
                ],
            )
            .await?;
        Ok(res)
    }

    /// date之前（不含当天）最近一份快照
    pub async fn get_latest_before(&self, date: &str) -> Result<Option<PortfolioSnapshotEntity>> {
        let sql = "select * from portfolio_snapshot where snapshot_date < ? order by snapshot_date desc limit 1";
        let mut list: Vec<PortfolioSnapshotEntity> = self
            .db
            .query_decode(sql, vec![rbs::to_value!(date)])
            .await?;
        Ok(list.pop())
    }

    /// 当月第一份快照的总值
    pub async fn get_month_start_value(&self, date: &str) -> Result<Option<f64>> {
        let month_prefix = if date.len() >= 7 { &date[..7] } else { date };
        let sql = "select total_value from portfolio_snapshot where snapshot_date like ? order by snapshot_date asc limit 1";
        let mut list: Vec<f64> = self
            .db
            .query_decode(sql, vec![rbs::to_value!(format!("{}%", month_prefix))])
            .await?;
        Ok(list.pop())
    }

    /// 月间损益 = 当前总值 - 当月初总值
    pub async fn calculate_monthly_pnl(&self, date: &str, current_value: f64) -> Result<f64> {
        match self.get_month_start_value(date).await? {
            Some(start) => Ok(current_value - start),
            None => Ok(0.0),
        }
    }

    /// 周间损益 = 当前总值 - 7天前（或更早最近一份）快照总值
    pub async fn calculate_weekly_pnl(&self, date: &str, current_value: f64) -> Result<f64> {
        let week_ago = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => (d - Duration::days(7)).format("%Y-%m-%d").to_string(),
            Err(_) => return Ok(0.0),
        };
        let sql = "select * from portfolio_snapshot where snapshot_date <= ? order by snapshot_date desc limit 1";
        let mut list: Vec<PortfolioSnapshotEntity> = self
            .db
            .query_decode(sql, vec![rbs::to_value!(week_ago)])
            .await?;
        match list.pop() {
            Some(snap) => Ok(current_value - snap.total_value),
            None => Ok(0.0),
        }
    }
}
