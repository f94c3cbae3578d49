extern crate rbatis;

use anyhow::Result;
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};

use crate::app_config::db;
use crate::time_util;

/// 通知送信的审计记录。送信失败也要落一行（error非空）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationLogEntity {
    pub symbol_id: String,
    pub action: String,
    pub message: String,
    pub success: i32,
    pub error: Option<String>,
    pub created_at: i64,
}

crud!(NotificationLogEntity {}, "notification_log");

pub struct NotificationLogModel {
    db: &'static RBatis,
}

impl NotificationLogModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `notification_log` (
            `id` bigint NOT NULL AUTO_INCREMENT,
            `symbol_id` varchar(32) NOT NULL,
            `action` varchar(16) NOT NULL,
            `message` text NOT NULL,
            `success` tinyint NOT NULL,
            `error` varchar(255) DEFAULT NULL,
            `created_at` bigint NOT NULL,
            PRIMARY KEY (`id`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    pub async fn add(
        &self,
        symbol_id: &str,
        action: &str,
        message: &str,
        success: bool,
        error: Option<String>,
    ) -> Result<ExecResult> {
        let row = NotificationLogEntity {
            symbol_id: symbol_id.to_string(),
            action: action.to_string(),
            message: message.to_string(),
            success: if success { 1 } else { 0 },
            error,
            created_at: time_util::now_millis(),
        };
        let data = NotificationLogEntity::insert(self.db, &row).await?;
        Ok(data)
    }
}
