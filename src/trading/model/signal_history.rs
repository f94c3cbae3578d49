extern crate rbatis;

use anyhow::Result;
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde_json::json;
use tracing::debug;

use crate::app_config::db;
use crate::trading::signal::aggregator::Decision;

/// 非HOLD判断的历史记录。写入时刻打时间戳，读取方不得假设因果顺序
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SignalHistoryEntity {
    pub symbol_id: String,
    pub action: String,
    pub confidence: f64,
    pub horizon_days: i32,
    pub reasons: String,
    pub decided_at: i64,
}

crud!(SignalHistoryEntity {}, "signal_history");

pub struct SignalHistoryModel {
    db: &'static RBatis,
}

impl SignalHistoryModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `signal_history` (
            `id` bigint NOT NULL AUTO_INCREMENT,
            `symbol_id` varchar(32) NOT NULL,
            `action` varchar(8) NOT NULL,
            `confidence` double NOT NULL,
            `horizon_days` int NOT NULL,
            `reasons` text,
            `decided_at` bigint NOT NULL,
            PRIMARY KEY (`id`),
            KEY `idx_symbol_decided` (`symbol_id`, `decided_at`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    pub async fn add(&self, decision: &Decision) -> Result<ExecResult> {
        let row = SignalHistoryEntity {
            symbol_id: decision.symbol_id.clone(),
            action: decision.action.as_str().to_string(),
            confidence: decision.confidence,
            horizon_days: decision.horizon_days as i32,
            reasons: serde_json::to_string(&decision.reasons)?,
            decided_at: decision.decided_at,
        };
        let data = SignalHistoryEntity::insert(self.db, &row).await?;
        debug!("insert_signal_history_result = {}", json!(data));
        Ok(data)
    }

    /// 最近n天内的记录条数（周报用）
    pub async fn count_since(&self, since_millis: i64) -> Result<i64> {
        let v: i64 = self
            .db
            .query_decode(
                "select count(*) from signal_history where decided_at >= ?",
                vec![rbs::to_value!(since_millis)],
            )
            .await?;
        Ok(v)
    }
}
