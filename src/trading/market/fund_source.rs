use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::app_config::env::env_or_default;
use crate::trading::market::{fetch_text_with_retry, PriceSource, Quote};
use crate::DailyBar;

/// 投信基准价源。按基金代码抓取CSV（年月日,基准价额），
/// 表示名到代码的映射是人工维护的
pub struct FundSource {
    client: Client,
    base_url: String,
}

/// 表示名 -> 基金代码（ISIN）。新基金在这里追加
const FUND_CODE_MAP: &[(&str, &str)] = &[
    ("eMAXIS Slim 全世界株式", "JP90C000H1T1"),
    ("eMAXIS Slim 米国株式(S&P500)", "JP90C000GKC6"),
    ("eMAXIS Slim 先進国株式", "JP90C000F7H5"),
    ("ニッセイ外国株式インデックス", "JP90C0009VE0"),
];

pub fn fund_code_for_name(name: &str) -> Option<&'static str> {
    FUND_CODE_MAP
        .iter()
        .find(|(n, _)| name.starts_with(n))
        .map(|(_, code)| *code)
}

impl FundSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: env_or_default(
                "FUND_CSV_URL",
                "https://toushin-lib.fwg.ne.jp/FdsWeb/FDST030000/csv-file-download",
            ),
        }
    }

    /// 标的ID本身是代码则直取，否则查映射表
    fn resolve_code(symbol_id: &str) -> Result<String> {
        if symbol_id.starts_with("JP90C") {
            return Ok(symbol_id.to_string());
        }
        fund_code_for_name(symbol_id)
            .map(|c| c.to_string())
            .ok_or_else(|| anyhow!("unknown fund: {}", symbol_id))
    }

    /// 基准价CSV: 一行 "年月日,基準価額(円),..."，日期为 YYYY年MM月DD日
    fn parse_nav_csv(body: &str) -> Vec<(String, f64)> {
        let mut rows = Vec::new();
        for line in body.lines().skip(1) {
            let cols: Vec<&str> = line.split(',').collect();
            if cols.len() < 2 {
                continue;
            }
            let date = normalize_jp_date(cols[0].trim());
            let nav: f64 = cols[1].trim().parse().unwrap_or(0.0);
            if let (Some(date), true) = (date, nav > 0.0) {
                rows.push((date, nav));
            }
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

/// "2026年07月31日" -> "2026-07-31"
fn normalize_jp_date(raw: &str) -> Option<String> {
    let digits: Vec<&str> = raw
        .split(|c| c == '年' || c == '月' || c == '日')
        .filter(|s| !s.is_empty())
        .collect();
    if digits.len() != 3 {
        return None;
    }
    let y: u32 = digits[0].parse().ok()?;
    let m: u32 = digits[1].parse().ok()?;
    let d: u32 = digits[2].parse().ok()?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) {
        return None;
    }
    Some(format!("{:04}-{:02}-{:02}", y, m, d))
}

#[async_trait]
impl PriceSource for FundSource {
    /// 基金没有OHLC，用基准价填满四价、成交量0
    async fn get_historical_series(&self, symbol_id: &str, days: u32) -> Result<Vec<DailyBar>> {
        let code = Self::resolve_code(symbol_id)?;
        let url = format!("{}?isinCd={}", self.base_url, code);
        let body = fetch_text_with_retry(&self.client, &url).await?;
        let mut rows = Self::parse_nav_csv(&body);
        if rows.is_empty() {
            return Err(anyhow!("no nav rows for fund {}", symbol_id));
        }
        if rows.len() > days as usize {
            rows = rows.split_off(rows.len() - days as usize);
        }
        let mut bars = Vec::with_capacity(rows.len());
        for (date, nav) in rows {
            bars.push(
                DailyBar::builder()
                    .date(&date)
                    .o(nav)
                    .h(nav)
                    .l(nav)
                    .c(nav)
                    .v(0.0)
                    .adj_c(nav)
                    .build()?,
            );
        }
        Ok(bars)
    }

    async fn get_latest_quote(&self, symbol_id: &str) -> Result<Quote> {
        let bars = self.get_historical_series(symbol_id, 2).await?;
        let last = bars.last().ok_or_else(|| anyhow!("empty nav series"))?;
        let prev_close = if bars.len() >= 2 {
            bars[bars.len() - 2].c()
        } else {
            last.c()
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
    fn test_normalize_jp_date() {
        assert_eq!(
            normalize_jp_date("2026年07月31日"),
            Some("2026-07-31".to_string())
        );
        assert_eq!(normalize_jp_date("garbage"), None);
    }

    #[test]
    fn test_parse_nav_csv_sorted() {
        let body = "年月日,基準価額(円),純資産総額（百万円）\n\
                    2026年07月31日,21500,123456\n\
                    2026年07月30日,21300,123000\n";
        let rows = FundSource::parse_nav_csv(body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "2026-07-30");
        assert_eq!(rows[1].1, 21500.0);
    }

    #[test]
    fn test_fund_code_lookup() {
        assert!(fund_code_for_name("eMAXIS Slim 全世界株式").is_some());
        assert!(fund_code_for_name("does not exist").is_none());
    }
}
