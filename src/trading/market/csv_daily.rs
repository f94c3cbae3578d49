use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::app_config::env::env_or_default;
use crate::trading::market::{fetch_text_with_retry, PriceSource, Quote};
use crate::DailyBar;

/// 免费CSV日足源（stooq）。主力数据源，返回 Date,Open,High,Low,Close,Volume
pub struct CsvDailySource {
    client: Client,
    base_url: String,
}

impl CsvDailySource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: env_or_default("CSV_SOURCE_URL", "https://stooq.com/q/d/l/"),
        }
    }

    /// "7203.T" -> "7203.jp"、"NVDA" -> "nvda.us"
    fn to_source_symbol(symbol_id: &str) -> String {
        if let Some(code) = symbol_id.strip_suffix(".T") {
            format!("{}.jp", code.to_lowercase())
        } else {
            format!("{}.us", symbol_id.to_lowercase())
        }
    }

    fn parse_csv(symbol_id: &str, body: &str) -> Result<Vec<DailyBar>> {
        let mut bars = Vec::new();
        for (i, line) in body.lines().enumerate() {
            if i == 0 || line.trim().is_empty() {
                // 跳过表头行
                continue;
            }
            let cols: Vec<&str> = line.split(',').collect();
            if cols.len() < 5 {
                continue;
            }
            let close: f64 = cols[4].trim().parse().unwrap_or(0.0);
            if close <= 0.0 {
                continue;
            }
            let volume: f64 = cols
                .get(5)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            let bar = DailyBar::builder()
                .date(cols[0].trim())
                .o(cols[1].trim().parse().unwrap_or(close))
                .h(cols[2].trim().parse().unwrap_or(close))
                .l(cols[3].trim().parse().unwrap_or(close))
                .c(close)
                .v(volume)
                .adj_c(close)
                .build();
            match bar {
                Ok(b) => bars.push(b),
                // 脏行直接丢弃
                Err(_) => continue,
            }
        }
        if bars.is_empty() {
            return Err(anyhow!("no usable rows in csv for {}", symbol_id));
        }
        bars.sort_by(|a, b| a.date().cmp(b.date()));
        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for CsvDailySource {
    async fn get_historical_series(&self, symbol_id: &str, days: u32) -> Result<Vec<DailyBar>> {
        let url = format!(
            "{}?s={}&i=d",
            self.base_url,
            Self::to_source_symbol(symbol_id)
        );
        let body = fetch_text_with_retry(&self.client, &url).await?;
        let mut bars = Self::parse_csv(symbol_id, &body)?;
        if bars.len() > days as usize {
            bars = bars.split_off(bars.len() - days as usize);
        }
        Ok(bars)
    }

    async fn get_latest_quote(&self, symbol_id: &str) -> Result<Quote> {
        let bars = self.get_historical_series(symbol_id, 2).await?;
        let last = bars.last().ok_or_else(|| anyhow!("empty series"))?;
        let prev_close = if bars.len() >= 2 {
            bars[bars.len() - 2].c()
        } else {
            last.o()
        };
        Ok(Quote {
            price: last.c(),
            prev_close,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_mapping() {
        assert_eq!(CsvDailySource::to_source_symbol("7203.T"), "7203.jp");
        assert_eq!(CsvDailySource::to_source_symbol("NVDA"), "nvda.us");
    }

    #[test]
    fn test_parse_csv() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2026-07-30,100,102,99,101,50000\n\
                    2026-07-31,101,103,100,102,60000\n";
        let bars = CsvDailySource::parse_csv("TEST", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date(), "2026-07-30");
        assert_eq!(bars[1].c(), 102.0);
    }

    #[test]
    fn test_parse_csv_skips_bad_rows() {
        let body = "Date,Open,High,Low,Close,Volume\n\
                    2026-07-30,100,102,99,101,50000\n\
                    2026-07-31,N/D,N/D,N/D,N/D,N/D\n";
        let bars = CsvDailySource::parse_csv("TEST", body).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_parse_csv_all_bad_is_error() {
        let body = "Date,Open,High,Low,Close,Volume\n";
        assert!(CsvDailySource::parse_csv("TEST", body).is_err());
    }
}
