pub mod csv_daily;
pub mod fund_source;
pub mod quote_api;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::trading::model::instrument::AssetType;
use crate::DailyBar;

pub use csv_daily::CsvDailySource;
pub use fund_source::FundSource;
pub use quote_api::QuoteApiSource;

/// 最新报价
#[derive(Debug, Clone, Copy)]
pub struct Quote {
    pub price: f64,
    pub prev_close: f64,
}

/// 行情源能力: 历史日足 + 最新报价。下游只依赖该能力，不关心具体提供方
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn get_historical_series(&self, symbol_id: &str, days: u32) -> Result<Vec<DailyBar>>;
    async fn get_latest_quote(&self, symbol_id: &str) -> Result<Quote>;
}

/// 按提供方打标签的变体。CSV源为主、JSON报价为备、基金按代码抓取
pub enum PriceProvider {
    Csv(CsvDailySource),
    Quote(QuoteApiSource),
    Fund(FundSource),
}

impl PriceProvider {
    /// 按资产类型选择主力行情源
    pub fn for_asset(asset_type: AssetType) -> PriceProvider {
        match asset_type {
            AssetType::Stock | AssetType::Etf => PriceProvider::Csv(CsvDailySource::new()),
            AssetType::MutualFund => PriceProvider::Fund(FundSource::new()),
        }
    }
}

#[async_trait]
impl PriceSource for PriceProvider {
    async fn get_historical_series(&self, symbol_id: &str, days: u32) -> Result<Vec<DailyBar>> {
        match self {
            PriceProvider::Csv(s) => s.get_historical_series(symbol_id, days).await,
            PriceProvider::Quote(s) => s.get_historical_series(symbol_id, days).await,
            PriceProvider::Fund(s) => s.get_historical_series(symbol_id, days).await,
        }
    }

    async fn get_latest_quote(&self, symbol_id: &str) -> Result<Quote> {
        match self {
            PriceProvider::Csv(s) => s.get_latest_quote(symbol_id).await,
            PriceProvider::Quote(s) => s.get_latest_quote(symbol_id).await,
            PriceProvider::Fund(s) => s.get_latest_quote(symbol_id).await,
        }
    }
}

/// 主力源失败时退到JSON报价API
pub async fn latest_quote_with_fallback(
    primary: &PriceProvider,
    symbol_id: &str,
) -> Result<Quote> {
    match primary.get_latest_quote(symbol_id).await {
        Ok(q) => Ok(q),
        Err(e) => {
            warn!("primary quote source failed for {}: {}, falling back", symbol_id, e);
            QuoteApiSource::new().get_latest_quote(symbol_id).await
        }
    }
}

/// 重试次数与初始等待（指数退避）
const RETRY_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY_SECS: u64 = 2;

/// 带指数退避的GET。429/超时等瞬断在这里消化，最终失败交由上层跳过该标的
pub async fn fetch_text_with_retry(client: &reqwest::Client, url: &str) -> Result<String> {
    let mut delay = Duration::from_secs(RETRY_BASE_DELAY_SECS);
    let mut last_err = None;
    for attempt in 1..=RETRY_ATTEMPTS {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.text().await?);
            }
            Ok(response) => {
                debug!(
                    "fetch attempt {}/{} status={} url={}",
                    attempt,
                    RETRY_ATTEMPTS,
                    response.status(),
                    url
                );
                last_err = Some(anyhow::anyhow!("http status {}", response.status()));
            }
            Err(e) => {
                debug!("fetch attempt {}/{} error={} url={}", attempt, RETRY_ATTEMPTS, e, url);
                last_err = Some(e.into());
            }
        }
        if attempt < RETRY_ATTEMPTS {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("fetch failed: {}", url)))
}
