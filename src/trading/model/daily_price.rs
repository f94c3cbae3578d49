extern crate rbatis;

use anyhow::Result;
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_config::db;
use crate::DailyBar;

/// 日足行情。主键(symbol_id, date)，REPLACE写入保证幂等。
/// intraday=1表示盘中临时生成的行，收盘后由清理任务删除
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyPriceEntity {
    pub symbol_id: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
    pub intraday: i32,
}

crud!(DailyPriceEntity {}, "daily_price");

impl DailyPriceEntity {
    pub fn from_bar(symbol_id: &str, bar: &DailyBar, intraday: bool) -> Self {
        Self {
            symbol_id: symbol_id.to_string(),
            date: bar.date().to_string(),
            open: bar.o(),
            high: bar.h(),
            low: bar.l(),
            close: bar.c(),
            volume: bar.v(),
            adj_close: bar.adj_c(),
            intraday: if intraday { 1 } else { 0 },
        }
    }

    /// 转回校验过的DailyBar。数据库中有脏数据时返回Err
    pub fn to_bar(&self) -> anyhow::Result<DailyBar> {
        DailyBar::builder()
            .date(&self.date)
            .o(self.open)
            .h(self.high)
            .l(self.low)
            .c(self.close)
            .v(self.volume)
            .adj_c(self.adj_close)
            .build()
    }
}

pub struct DailyPriceModel {
    db: &'static RBatis,
}

impl DailyPriceModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `daily_price` (
            `symbol_id` varchar(32) NOT NULL,
            `date` varchar(10) NOT NULL,
            `open` double NOT NULL,
            `high` double NOT NULL,
            `low` double NOT NULL,
            `close` double NOT NULL,
            `volume` double NOT NULL,
            `adj_close` double NOT NULL,
            `intraday` tinyint NOT NULL DEFAULT 0,
            PRIMARY KEY (`symbol_id`, `date`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    /// 幂等写入：同一(symbol_id, date)重复插入等价于覆盖
    pub async fn insert(&self, row: &DailyPriceEntity) -> Result<ExecResult> {
        let sql = "REPLACE INTO daily_price (symbol_id, date, open, high, low, close, volume, adj_close, intraday) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
        let res = self
            .db
            .exec(
                sql,
                vec![
                    rbs::to_value!(row.symbol_id.clone()),
                    rbs::to_value!(row.date.clone()),
                    rbs::to_value!(row.open),
                    rbs::to_value!(row.high),
                    rbs::to_value!(row.low),
                    rbs::to_value!(row.close),
                    rbs::to_value!(row.volume),
                    rbs::to_value!(row.adj_close),
                    rbs::to_value!(row.intraday),
                ],
            )
            .await?;
        Ok(res)
    }

    pub async fn insert_batch(&self, rows: &[DailyPriceEntity]) -> Result<usize> {
        for row in rows {
            self.insert(row).await?;
        }
        debug!("daily_price saved {} rows", rows.len());
        Ok(rows.len())
    }

    /// 最近days根日足，按日期升序返回
    pub async fn get_recent(&self, symbol_id: &str, days: u32) -> Result<Vec<DailyPriceEntity>> {
        let sql = "SELECT * FROM (SELECT * FROM daily_price WHERE symbol_id = ? ORDER BY date DESC LIMIT ?) t ORDER BY date ASC";
        let list: Vec<DailyPriceEntity> = self
            .db
            .query_decode(sql, vec![rbs::to_value!(symbol_id), rbs::to_value!(days)])
            .await?;
        Ok(list)
    }

    /// 删除今天以前的盘中临时行
    pub async fn cleanup_intraday(&self, today: &str) -> Result<u64> {
        let sql = "DELETE FROM daily_price WHERE intraday = 1 AND date < ?";
        let res = self.db.exec(sql, vec![rbs::to_value!(today)]).await?;
        Ok(res.rows_affected)
    }
}
