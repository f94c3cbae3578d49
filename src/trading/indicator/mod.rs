pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume_ratio;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::DailyBar;

/// 指标计算所需的最小K线数
pub const MIN_BARS: usize = 60;

/// 一个标的的全部技术指标快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub sma20: f64,
    pub sma60: f64,
    pub sma120: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub rsi14: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub atr20: f64,
    pub adx14: f64,
    pub di_plus: f64,
    pub di_minus: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub volume_ratio20: f64,
}

/// 从升序日足序列计算指标集。少于60根返回InsufficientData
pub fn compute_indicators(symbol: &str, bars: &[DailyBar]) -> Result<IndicatorBundle, AppError> {
    if bars.len() < MIN_BARS {
        return Err(AppError::InsufficientData {
            symbol: symbol.to_string(),
            need: MIN_BARS,
            have: bars.len(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.c()).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.v()).collect();

    let macd_out = macd::macd(&closes);
    let adx_out = adx::adx(bars, 14);
    let bb = bollinger::bollinger(&closes, 20, 2.0);

    let bundle = IndicatorBundle {
        sma20: sma::sma(&closes, 20),
        sma60: sma::sma(&closes, 60),
        sma120: sma::sma(&closes, 120),
        ema12: ema::ema(&closes, 12),
        ema26: ema::ema(&closes, 26),
        rsi14: rsi::rsi(&closes, 14),
        macd_line: macd_out.line,
        macd_signal: macd_out.signal,
        macd_histogram: macd_out.histogram,
        atr20: atr::atr(bars, 20),
        adx14: adx_out.adx,
        di_plus: adx_out.di_plus,
        di_minus: adx_out.di_minus,
        bb_upper: bb.upper,
        bb_middle: bb.middle,
        bb_lower: bb.lower,
        volume_ratio20: volume_ratio::volume_ratio(&volumes, 20),
    };

    bundle.check_finite()?;
    Ok(bundle)
}

impl IndicatorBundle {
    /// 非有限值视为程序错误（跳过该标的，不通知）
    pub fn check_finite(&self) -> Result<(), AppError> {
        let values = [
            self.sma20,
            self.sma60,
            self.sma120,
            self.ema12,
            self.ema26,
            self.rsi14,
            self.macd_line,
            self.macd_signal,
            self.macd_histogram,
            self.atr20,
            self.adx14,
            self.di_plus,
            self.di_minus,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.volume_ratio20,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::ComputeError("indicator is not finite".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<DailyBar> {
        (0..n)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.2).sin() * 5.0;
                DailyBar::builder()
                    .date(&format!("2025-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
                    .o(base)
                    .h(base + 1.0)
                    .l(base - 1.0)
                    .c(base + 0.5)
                    .v(1000.0 + i as f64)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_compute_requires_60_bars() {
        let bars = series(59);
        let err = compute_indicators("TEST", &bars).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { have: 59, .. }));
    }

    #[test]
    fn test_compute_full_bundle() {
        let bars = series(130);
        let bundle = compute_indicators("TEST", &bars).unwrap();
        assert!(bundle.rsi14 >= 0.0 && bundle.rsi14 <= 100.0);
        assert!(bundle.bb_upper >= bundle.bb_middle);
        assert!(bundle.bb_lower <= bundle.bb_middle);
        assert!(bundle.atr20 > 0.0);
        assert!(bundle.check_finite().is_ok());
    }
}
