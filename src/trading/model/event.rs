extern crate rbatis;

use anyhow::Result;
use chrono::{Duration, Utc};
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};

use crate::app_config::db;

/// 事件日历（决算、配息、指数调整等）。importance: 1-低, 2-中, 3-高
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventEntity {
    pub id: Option<i64>,
    pub symbol_id: String,
    pub event_date: String,
    pub description: String,
    pub importance: i32,
}

crud!(EventEntity {}, "event_calendar");

pub struct EventModel {
    db: &'static RBatis,
}

impl EventModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `event_calendar` (
            `id` bigint NOT NULL AUTO_INCREMENT,
            `symbol_id` varchar(32) NOT NULL,
            `event_date` varchar(10) NOT NULL,
            `description` varchar(255) NOT NULL,
            `importance` tinyint NOT NULL DEFAULT 1,
            PRIMARY KEY (`id`),
            KEY `idx_event_date` (`event_date`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    /// 未来horizon_days天内的事件（含当天），按日期升序
    pub async fn get_upcoming(&self, horizon_days: u32) -> Result<Vec<EventEntity>> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let until = (Utc::now() + Duration::days(horizon_days as i64))
            .format("%Y-%m-%d")
            .to_string();
        let sql = "select * from event_calendar where event_date >= ? and event_date <= ? order by event_date asc";
        let list: Vec<EventEntity> = self
            .db
            .query_decode(sql, vec![rbs::to_value!(today), rbs::to_value!(until)])
            .await?;
        Ok(list)
    }

    /// 某个标的的事件（全市场事件symbol_id为'*'）
    pub fn filter_for_symbol(events: &[EventEntity], symbol_id: &str) -> Vec<EventEntity> {
        events
            .iter()
            .filter(|e| e.symbol_id == symbol_id || e.symbol_id == "*")
            .cloned()
            .collect()
    }
}
