extern crate rbatis;

use anyhow::Result;
use rbatis::rbdc::db::ExecResult;
use rbatis::{crud, RBatis};
use serde::{Deserialize, Serialize};

use crate::app_config::db;

/// 市场
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Market {
    Jp,
    Us,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Jp => "JP",
            Market::Us => "US",
        }
    }
    pub fn from_str(s: &str) -> Option<Market> {
        match s {
            "JP" => Some(Market::Jp),
            "US" => Some(Market::Us),
            _ => None,
        }
    }
}

/// 资产类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Stock,
    Etf,
    MutualFund,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Etf => "etf",
            AssetType::MutualFund => "mutual_fund",
        }
    }
    pub fn from_str(s: &str) -> Option<AssetType> {
        match s {
            "stock" => Some(AssetType::Stock),
            "etf" => Some(AssetType::Etf),
            "mutual_fund" => Some(AssetType::MutualFund),
            _ => None,
        }
    }
}

/// 监视标的。创建后除is_active外不可变
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstrumentEntity {
    pub symbol_id: String,
    pub name: String,
    pub market: String,
    pub asset_type: String,
    pub is_active: i32,
}

crud!(InstrumentEntity {}, "instrument");

impl InstrumentEntity {
    pub fn market(&self) -> Option<Market> {
        Market::from_str(&self.market)
    }
    pub fn asset_type(&self) -> Option<AssetType> {
        AssetType::from_str(&self.asset_type)
    }
}

pub struct InstrumentModel {
    db: &'static RBatis,
}

impl InstrumentModel {
    pub fn new() -> Self {
        Self {
            db: db::get_db_client(),
        }
    }

    pub async fn create_table(&self) -> Result<ExecResult> {
        let sql = "CREATE TABLE IF NOT EXISTS `instrument` (
            `symbol_id` varchar(32) NOT NULL,
            `name` varchar(128) NOT NULL,
            `market` varchar(8) NOT NULL,
            `asset_type` varchar(16) NOT NULL,
            `is_active` tinyint NOT NULL DEFAULT 1,
            PRIMARY KEY (`symbol_id`)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";
        let res = self.db.exec(sql, vec![]).await?;
        Ok(res)
    }

    /// 全部标的。active_only=true时只取有效的
    pub async fn get_all(&self, active_only: bool) -> Result<Vec<InstrumentEntity>> {
        let sql = if active_only {
            "select * from instrument where is_active = 1 order by symbol_id"
        } else {
            "select * from instrument order by symbol_id"
        };
        let list: Vec<InstrumentEntity> = self.db.query_decode(sql, vec![]).await?;
        Ok(list)
    }

    pub async fn add(&self, item: &InstrumentEntity) -> Result<ExecResult> {
        let sql = "REPLACE INTO instrument (symbol_id, name, market, asset_type, is_active) VALUES (?, ?, ?, ?, ?)";
        let res = self
            .db
            .exec(
                sql,
                vec![
                    rbs::to_value!(item.symbol_id.clone()),
                    rbs::to_value!(item.name.clone()),
                    rbs::to_value!(item.market.clone()),
                    rbs::to_value!(item.asset_type.clone()),
                    rbs::to_value!(item.is_active),
                ],
            )
            .await?;
        Ok(res)
    }
}
