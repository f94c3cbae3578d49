use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::app_config::env::env_or_default;
use crate::trading::market::{PriceSource, Quote};
use crate::DailyBar;

/// JSON报价API（备用源）。只提供最新报价，不提供历史日足
pub struct QuoteApiSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    price: f64,
    prev_close: f64,
}

impl QuoteApiSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: env_or_default("QUOTE_API_URL", "https://api.example-quotes.dev/v1/quote"),
        }
    }
}

#[async_trait]
impl PriceSource for QuoteApiSource {
    async fn get_historical_series(&self, symbol_id: &str, _days: u32) -> Result<Vec<DailyBar>> {
        Err(anyhow!(
            "quote api does not serve historical series ({})",
            symbol_id
        ))
    }

    async fn get_latest_quote(&self, symbol_id: &str) -> Result<Quote> {
        let url = format!("{}?symbol={}", self.base_url, symbol_id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("quote api status {}", response.status()));
        }
        let parsed: QuoteResponse = response.json().await?;
        if parsed.price <= 0.0 {
            return Err(anyhow!("quote api returned non-positive price"));
        }
        Ok(Quote {
            price: parsed.price,
            prev_close: parsed.prev_close,
        })
    }
}
