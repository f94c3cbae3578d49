extern crate rbatis;

use anyhow::Result;
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};

use crate::app_config::db;
use crate::time_util;

/// 持仓。market_value与unrealized_pnl为派生列，
/// 更新现价时必须在同一条UPDATE里一并重算
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HoldingEntity {
    pub symbol_id: String,
    pub account_class: String,
    pub quantity: f64,
    pub avg_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub currency: String,
    pub updated_at: i64,
}

crud!(HoldingEntity {}, "holding");

pub struct HoldingModel {
    db: &'static RBatis,
}

impl HoldingModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `holding` (
            `symbol_id` varchar(32) NOT NULL,
            `account_class` varchar(32) NOT NULL DEFAULT 'specific',
            `quantity` double NOT NULL,
            `avg_cost` double NOT NULL,
            `current_price` double NOT NULL DEFAULT 0,
            `market_value` double NOT NULL DEFAULT 0,
            `unrealized_pnl` double NOT NULL DEFAULT 0,
            `currency` varchar(8) NOT NULL DEFAULT 'JPY',
            `updated_at` bigint NOT NULL DEFAULT 0,
            PRIMARY KEY (`symbol_id`, `account_class`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    pub async fn get_all(&self) -> Result<Vec<HoldingEntity>> {
        let list: Vec<HoldingEntity> = self
            .db
            .query_decode("select * from holding order by symbol_id", vec![])
            .await?;
        Ok(list)
    }

    /// 持仓中的标的ID集合（聚合器的持仓覆写判定用）
    pub async fn get_symbol_ids(&self) -> Result<Vec<String>> {
        let list: Vec<String> = self
            .db
            .query_decode("select distinct symbol_id from holding", vec![])
            .await?;
        Ok(list)
    }

    /// 现价更新：派生列在同一条UPDATE内重算，保证原子性
    pub async fn update_price(&self, symbol_id: &str, price: f64) -> Result<ExecResult> {
        let sql = "UPDATE holding SET current_price = ?, \
                   market_value = quantity * ?, \
                   unrealized_pnl = quantity * (? - avg_cost), \
                   updated_at = ? \
                   WHERE symbol_id = ?";
        let res = self
            .db
            .exec(
                sql,
                vec![
                    rbs::to_value!(price),
                    rbs::to_value!(price),
                    rbs::to_value!(price),
                    rbs::to_value!(time_util::now_millis()),
                    rbs::to_value!(symbol_id),
                ],
            )
            .await?;
        Ok(res)
    }

    /// 持仓总市值
    pub async fn total_market_value(&self) -> Result<f64> {
        let v: f64 = self
            .db
            .query_decode("select ifnull(sum(market_value), 0) from holding", vec![])
            .await?;
        Ok(v)
    }
}
